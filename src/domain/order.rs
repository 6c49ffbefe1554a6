//! Order — external input, not owned by this core (spec §3.1).

use serde::{Deserialize, Serialize};

use super::ids::OrderId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub sku: String,
    pub quantity: u32,
    /// Weight in kilograms.
    pub weight: f64,
    #[serde(default)]
    pub is_fragile: bool,
    #[serde(default)]
    pub is_hazmat: bool,
    #[serde(default)]
    pub requires_cold_chain: bool,
    pub unit_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftWrapDetails {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub wrap_style: Option<String>,
}

/// An order as ingested from an external channel. Immutable for routing
/// purposes once ingested — nothing in this crate mutates an `Order`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub gift_wrap: bool,
    #[serde(default)]
    pub gift_wrap_details: Option<GiftWrapDetails>,
    pub total_value: f64,
    /// Whether the order's items span more than one pick zone. Derived
    /// upstream (wave planning); this core treats it as an input.
    #[serde(default)]
    pub multi_zone: bool,
    /// Free-form order type used by `SelectionCriteria.orderTypes` matching.
    #[serde(default)]
    pub order_type: Option<String>,
}

impl Order {
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}
