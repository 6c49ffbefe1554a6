//! StageTemplate — reusable stage-sequence recipe (spec §3.3). Authored and
//! seeded out of band; the engine only reads these.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::ids::TemplateId;

/// Closed, tagged enumeration of stage kinds (spec §9 "dynamic-dispatch to
/// tagged variant"). The orchestrator dispatches on this tag; new stage
/// kinds require extending the enum and the dispatch table in
/// [`crate::workflows`], not a new trait impl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageType {
    Picking,
    Walling,
    Consolidation,
    GiftWrap,
    Packing,
    Shipping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDefinition {
    pub order: u32,
    pub stage_type: StageType,
    pub task_type: String,
    pub required: bool,
    pub timeout_mins: u32,
    #[serde(default)]
    pub config: serde_json::Value,
}

impl StageDefinition {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_mins as u64 * 60)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionCriteria {
    pub min_items: u32,
    pub max_items: u32,
    #[serde(default)]
    pub requires_multi_zone: bool,
    #[serde(default)]
    pub order_types: Vec<String>,
    pub priority: i32,
}

impl SelectionCriteria {
    pub fn items_in_range(&self, item_count: u32) -> bool {
        self.min_items <= item_count && item_count <= self.max_items
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTemplate {
    pub template_id: TemplateId,
    /// e.g. "pick_pack", "pick_wall_pack", "pick_consolidate_pack".
    pub path_type: String,
    /// Must be sorted by `order` — callers construct via [`Self::new`] or
    /// are responsible for the invariant themselves when deserializing.
    pub stages: Vec<StageDefinition>,
    pub selection_criteria: SelectionCriteria,
    pub is_default: bool,
    pub active: bool,
}

impl StageTemplate {
    /// True iff `stages` contains a `consolidation` or `walling` stage
    /// (spec §4.4.1: a template satisfying `consolidationRequired` MUST
    /// contain one or the other — §9's open question on the two being
    /// distinct-but-overlapping concepts is left open here too).
    pub fn has_consolidation_stage(&self) -> bool {
        self.stages
            .iter()
            .any(|s| matches!(s.stage_type, StageType::Consolidation | StageType::Walling))
    }

    /// The built-in fallback template used when no persisted default exists
    /// (spec §4.4.1 "Fallback order"): picking -> packing.
    pub fn built_in_pick_pack() -> Self {
        Self {
            template_id: TemplateId(uuid::Uuid::nil()),
            path_type: "pick_pack".to_string(),
            stages: vec![
                StageDefinition {
                    order: 0,
                    stage_type: StageType::Picking,
                    task_type: "pick".to_string(),
                    required: true,
                    timeout_mins: 30,
                    config: serde_json::Value::Null,
                },
                StageDefinition {
                    order: 1,
                    stage_type: StageType::Packing,
                    task_type: "pack".to_string(),
                    required: true,
                    timeout_mins: 30,
                    config: serde_json::Value::Null,
                },
            ],
            selection_criteria: SelectionCriteria {
                min_items: 0,
                max_items: u32::MAX,
                requires_multi_zone: false,
                order_types: vec![],
                priority: i32::MIN,
            },
            is_default: true,
            active: true,
        }
    }
}
