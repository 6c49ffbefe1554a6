//! Template selection (spec §4.4.1, P2 "Template selection totality").

use crate::domain::process_path::ProcessPath;
use crate::domain::stage_template::StageTemplate;

/// Derived inputs used alongside the process path for selection.
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext<'a> {
    pub item_count: u32,
    pub multi_zone: bool,
    pub order_type: Option<&'a str>,
}

/// Filter + sort + pick the top matching template (spec §4.4.1). Always
/// returns a template: falls back to `persisted_default`, then the
/// built-in `pick_pack` template (spec P2 totality).
pub fn select_template(
    candidates: &[StageTemplate],
    path: &ProcessPath,
    ctx: SelectionContext<'_>,
    persisted_default: Option<&StageTemplate>,
) -> StageTemplate {
    let mut matches: Vec<&StageTemplate> = candidates
        .iter()
        .filter(|t| t.active)
        .filter(|t| t.selection_criteria.items_in_range(ctx.item_count))
        .filter(|t| !path.consolidation_required || t.has_consolidation_stage())
        .filter(|t| !t.selection_criteria.requires_multi_zone || ctx.multi_zone)
        .filter(|t| {
            t.selection_criteria.order_types.is_empty()
                || ctx
                    .order_type
                    .map(|ot| t.selection_criteria.order_types.iter().any(|c| c == ot))
                    .unwrap_or(false)
        })
        .collect();

    // Sort by priority descending; tie-break isDefault=true, then
    // lexicographic TemplateID (spec §4.4.1).
    matches.sort_by(|a, b| {
        b.selection_criteria
            .priority
            .cmp(&a.selection_criteria.priority)
            .then_with(|| b.is_default.cmp(&a.is_default))
            .then_with(|| a.template_id.0.to_string().cmp(&b.template_id.0.to_string()))
    });

    if let Some(best) = matches.first() {
        return (*best).clone();
    }

    if let Some(default) = persisted_default {
        return default.clone();
    }

    StageTemplate::built_in_pick_pack()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::{PathId, TemplateId};
    use crate::domain::stage_template::{SelectionCriteria, StageDefinition, StageType};

    fn path(consolidation_required: bool) -> ProcessPath {
        ProcessPath {
            path_id: PathId::new(),
            order_id: crate::domain::ids::OrderId::new(),
            requirements: vec![],
            consolidation_required,
            gift_wrap_required: false,
            special_handling: vec![],
            target_station_id: None,
            created_at: chrono::Utc::now(),
        }
    }

    fn template(path_type: &str, priority: i32, has_consolidation: bool, is_default: bool) -> StageTemplate {
        let mut stages = vec![StageDefinition {
            order: 0,
            stage_type: StageType::Picking,
            task_type: "pick".into(),
            required: true,
            timeout_mins: 30,
            config: serde_json::Value::Null,
        }];
        if has_consolidation {
            stages.push(StageDefinition {
                order: 1,
                stage_type: StageType::Consolidation,
                task_type: "consolidate".into(),
                required: true,
                timeout_mins: 20,
                config: serde_json::Value::Null,
            });
        }
        stages.push(StageDefinition {
            order: stages.len() as u32,
            stage_type: StageType::Packing,
            task_type: "pack".into(),
            required: true,
            timeout_mins: 30,
            config: serde_json::Value::Null,
        });
        StageTemplate {
            template_id: TemplateId::new(),
            path_type: path_type.into(),
            stages,
            selection_criteria: SelectionCriteria {
                min_items: 1,
                max_items: 10,
                requires_multi_zone: false,
                order_types: vec![],
                priority,
            },
            is_default,
            active: true,
        }
    }

    #[test]
    fn p2_totality_falls_back_to_built_in() {
        let selected = select_template(
            &[],
            &path(false),
            SelectionContext {
                item_count: 1,
                multi_zone: false,
                order_type: None,
            },
            None,
        );
        assert_eq!(selected.path_type, "pick_pack");
    }

    #[test]
    fn consolidation_required_filters_out_non_consolidating_templates() {
        let pick_pack = template("pick_pack", 10, false, false);
        let pick_consolidate = template("pick_consolidate_pack", 5, true, false);
        let selected = select_template(
            &[pick_pack, pick_consolidate.clone()],
            &path(true),
            SelectionContext {
                item_count: 3,
                multi_zone: false,
                order_type: None,
            },
            None,
        );
        assert_eq!(selected.template_id, pick_consolidate.template_id);
    }

    #[test]
    fn higher_priority_wins() {
        let low = template("a", 1, false, false);
        let high = template("b", 100, false, false);
        let selected = select_template(
            &[low, high.clone()],
            &path(false),
            SelectionContext {
                item_count: 1,
                multi_zone: false,
                order_type: None,
            },
            None,
        );
        assert_eq!(selected.template_id, high.template_id);
    }

    #[test]
    fn out_of_range_item_count_is_excluded() {
        let tmpl = template("a", 10, false, false);
        let selected = select_template(
            &[tmpl],
            &path(false),
            SelectionContext {
                item_count: 100,
                multi_zone: false,
                order_type: None,
            },
            None,
        );
        assert_eq!(selected.path_type, "pick_pack");
    }
}
