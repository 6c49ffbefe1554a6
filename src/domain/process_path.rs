//! ProcessPath — the classified shape of an order's handling requirements
//! (spec §3.2). Produced once per order by [`crate::process_path::determine`].

use serde::{Deserialize, Serialize};

use super::ids::{OrderId, PathId, StationId};

/// Closed vocabulary of classification requirements (spec §3.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    SingleItem,
    MultiItem,
    GiftWrap,
    HighValue,
    Fragile,
    Oversized,
    Hazmat,
    ColdChain,
}

/// Handler tags derived 1:1 from requirements (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialHandlingTag {
    HighValueVerification,
    FragilePacking,
    HazmatCompliance,
    ColdChainPackaging,
}

impl Requirement {
    /// 1:1 mapping from requirement to special-handling tag (spec §4.3).
    /// `single_item`, `multi_item`, and `gift_wrap` carry no handler tag of
    /// their own — they shape template selection and stages instead.
    pub fn special_handling_tag(self) -> Option<SpecialHandlingTag> {
        match self {
            Requirement::HighValue => Some(SpecialHandlingTag::HighValueVerification),
            Requirement::Fragile => Some(SpecialHandlingTag::FragilePacking),
            Requirement::Hazmat => Some(SpecialHandlingTag::HazmatCompliance),
            Requirement::ColdChain => Some(SpecialHandlingTag::ColdChainPackaging),
            Requirement::SingleItem
            | Requirement::MultiItem
            | Requirement::GiftWrap
            | Requirement::Oversized => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessPath {
    pub path_id: PathId,
    pub order_id: OrderId,
    /// Ordered set drawn from the closed vocabulary. Insertion order follows
    /// the evaluation order in spec §4.3 so two calls on equal input produce
    /// byte-identical output modulo `path_id`/timestamps (spec P1).
    pub requirements: Vec<Requirement>,
    pub consolidation_required: bool,
    pub gift_wrap_required: bool,
    pub special_handling: Vec<SpecialHandlingTag>,
    pub target_station_id: Option<StationId>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ProcessPath {
    pub fn has(&self, req: Requirement) -> bool {
        self.requirements.contains(&req)
    }
}
