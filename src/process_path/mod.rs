//! Process-Path Resolver (C3, spec §4.3).
//!
//! Pure function over order items and total value; produces a
//! [`ProcessPath`]. Two calls on equal input yield equal output modulo
//! `path_id`/timestamps (spec P1) — `determine` takes no hidden inputs
//! beyond `order` and `thresholds`, and the caller supplies `now`/`path_id`
//! generation explicitly so the function itself stays deterministic.

pub mod store;

use crate::config::ThresholdConfig;
use crate::domain::order::Order;
use crate::domain::process_path::{ProcessPath, Requirement, SpecialHandlingTag};
use crate::domain::ids::PathId;

/// Run the C3 classification algorithm (spec §4.3 steps 1-7).
pub fn determine(order: &Order, thresholds: &ThresholdConfig, now: chrono::DateTime<chrono::Utc>) -> ProcessPath {
    let mut requirements = Vec::new();

    // 1. single_item / multi_item — mutually exclusive (spec §3.2 invariant).
    let is_single = order.items.len() == 1 && order.items[0].quantity == 1;
    requirements.push(if is_single {
        Requirement::SingleItem
    } else {
        Requirement::MultiItem
    });

    // 2. gift_wrap
    if order.gift_wrap {
        requirements.push(Requirement::GiftWrap);
    }

    // 3. high_value
    if order.total_value >= thresholds.high_value_threshold {
        requirements.push(Requirement::HighValue);
    }

    // 4. fragile
    if order.items.iter().any(|i| i.is_fragile) {
        requirements.push(Requirement::Fragile);
    }

    // 5. oversized
    if order
        .items
        .iter()
        .any(|i| i.weight >= thresholds.oversized_weight_threshold)
    {
        requirements.push(Requirement::Oversized);
    }

    // 6. hazmat
    if order.items.iter().any(|i| i.is_hazmat) {
        requirements.push(Requirement::Hazmat);
    }

    // 7. cold_chain
    if order.items.iter().any(|i| i.requires_cold_chain) {
        requirements.push(Requirement::ColdChain);
    }

    let special_handling: Vec<SpecialHandlingTag> = requirements
        .iter()
        .filter_map(|r| r.special_handling_tag())
        .collect();

    let consolidation_required = !is_single;
    let gift_wrap_required = order.gift_wrap;

    ProcessPath {
        path_id: PathId::new(),
        order_id: order.order_id,
        requirements,
        consolidation_required,
        gift_wrap_required,
        special_handling,
        target_station_id: None,
        created_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::LineItem;

    fn now() -> chrono::DateTime<chrono::Utc> {
        chrono::Utc::now()
    }

    fn item(sku: &str, qty: u32, weight: f64) -> LineItem {
        LineItem {
            sku: sku.into(),
            quantity: qty,
            weight,
            is_fragile: false,
            is_hazmat: false,
            requires_cold_chain: false,
            unit_price: 1.0,
        }
    }

    fn order(items: Vec<LineItem>, total_value: f64) -> Order {
        Order {
            order_id: crate::domain::ids::OrderId::new(),
            items,
            gift_wrap: false,
            gift_wrap_details: None,
            total_value,
            multi_zone: false,
            order_type: None,
        }
    }

    #[test]
    fn s1_simple_single_item_order() {
        let o = order(vec![item("HDMI-6FT", 1, 0.15)], 12.99);
        let p = determine(&o, &ThresholdConfig::default(), now());
        assert_eq!(p.requirements, vec![Requirement::SingleItem]);
        assert!(p.special_handling.is_empty());
        assert!(!p.consolidation_required);
    }

    #[test]
    fn s2_high_value_fragile_tv() {
        let mut o = order(vec![item("TV", 1, 22.0)], 1499.99);
        o.items[0].is_fragile = true;
        let p = determine(&o, &ThresholdConfig::default(), now());
        assert_eq!(
            p.requirements,
            vec![Requirement::SingleItem, Requirement::HighValue, Requirement::Fragile]
        );
        assert_eq!(
            p.special_handling,
            vec![
                SpecialHandlingTag::HighValueVerification,
                SpecialHandlingTag::FragilePacking
            ]
        );
    }

    #[test]
    fn s3_multi_item_requires_consolidation() {
        let o = order(
            vec![item("A", 1, 1.0), item("B", 1, 1.0), item("C", 1, 1.0)],
            30.0,
        );
        let p = determine(&o, &ThresholdConfig::default(), now());
        assert!(p.has(Requirement::MultiItem));
        assert!(p.consolidation_required);
    }

    #[test]
    fn s4_hazmat_car_battery() {
        let mut o = order(vec![item("BATTERY", 1, 15.0)], 80.0);
        o.items[0].is_hazmat = true;
        let p = determine(&o, &ThresholdConfig::default(), now());
        assert!(p.has(Requirement::Hazmat));
        assert_eq!(p.special_handling, vec![SpecialHandlingTag::HazmatCompliance]);
    }

    #[test]
    fn s5_cold_chain_gift_order() {
        let mut o = order(vec![item("A", 1, 1.0), item("B", 1, 1.0)], 600.0);
        o.items.iter_mut().for_each(|i| i.requires_cold_chain = true);
        o.gift_wrap = true;
        let p = determine(&o, &ThresholdConfig::default(), now());
        assert_eq!(
            p.requirements,
            vec![
                Requirement::MultiItem,
                Requirement::GiftWrap,
                Requirement::HighValue,
                Requirement::ColdChain
            ]
        );
        assert!(p.gift_wrap_required);
    }

    #[test]
    fn p1_deterministic_modulo_id_and_timestamp() {
        let o = order(vec![item("A", 1, 1.0)], 10.0);
        let thresholds = ThresholdConfig::default();
        let p1 = determine(&o, &thresholds, now());
        let p2 = determine(&o, &thresholds, now());
        assert_eq!(p1.requirements, p2.requirements);
        assert_eq!(p1.special_handling, p2.special_handling);
        assert_eq!(p1.consolidation_required, p2.consolidation_required);
        assert_eq!(p1.gift_wrap_required, p2.gift_wrap_required);
    }

    #[test]
    fn thresholds_are_configurable() {
        let o = order(vec![item("A", 1, 10.0)], 100.0);
        let custom = ThresholdConfig {
            high_value_threshold: 50.0,
            oversized_weight_threshold: 5.0,
        };
        let p = determine(&o, &custom, now());
        assert!(p.has(Requirement::HighValue));
        assert!(p.has(Requirement::Oversized));
    }
}
