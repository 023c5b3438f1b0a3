//! Action log filtering for display
//!
//! Stages can be re-entered after a reversion, so the raw log carries
//! duplicate start and exit entries for the same stage. The display view
//! keeps one start and one exit per stage at most, positioned relative
//! to the contract's current stage, and leaves every other action kind
//! untouched.

use conductor_types::{ActionItem, Flow, StageId};
use std::collections::HashMap;

/// Filter a contract's raw action log down to its display form.
///
/// Per stage: the most recent start action (entered or reversion) is
/// kept only when the stage is at or before `current_pos`; the most
/// recent exit only when strictly before. Actions on stages outside the
/// flow (or when the contract is not positioned on the flow) keep no
/// start/exit entries at all. The result is sorted into chronological
/// display order, reversions ordered by their embedded timestamp.
pub(crate) fn filter_for_display(
    actions: Vec<&ActionItem>,
    flow: Option<&Flow>,
    current_pos: Option<usize>,
) -> Vec<ActionItem> {
    let mut by_stage: HashMap<StageId, Vec<&ActionItem>> = HashMap::new();
    for item in actions {
        by_stage
            .entry(item.contract_stage.stage_id.clone())
            .or_default()
            .push(item);
    }

    let mut kept: Vec<ActionItem> = Vec::new();
    for (stage_id, mut items) in by_stage {
        // Most recent first within the stage
        items.sort_by_key(|i| std::cmp::Reverse(i.taken_at));

        let pos = flow.and_then(|f| f.position_of(&stage_id));
        let keep_start = matches!((pos, current_pos), (Some(p), Some(c)) if p <= c);
        let keep_exit = matches!((pos, current_pos), (Some(p), Some(c)) if p < c);

        let mut start_kept = false;
        let mut exit_kept = false;
        for item in items {
            if item.kind.is_start() {
                if keep_start && !start_kept {
                    kept.push(item.clone());
                    start_kept = true;
                }
            } else if item.kind.is_exit() {
                if keep_exit && !exit_kept {
                    kept.push(item.clone());
                    exit_kept = true;
                }
            } else {
                kept.push(item.clone());
            }
        }
    }

    kept.sort_by_key(|i| (i.sort_key(), i.taken_at));
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use conductor_types::{
        ActionKind, ContractId, ContractStageKey, FlowId, UserId,
    };

    fn item(stage: &StageId, kind: ActionKind, minutes_ago: i64) -> ActionItem {
        let key = ContractStageKey::new(
            ContractId::new("c1"),
            stage.clone(),
            FlowId::new("f1"),
        );
        ActionItem::new(key, kind)
            .with_taken_by(UserId::new("u1"))
            .with_taken_at(Utc::now() - Duration::minutes(minutes_ago))
    }

    fn two_stage_flow() -> (Flow, Vec<StageId>) {
        let stages = vec![StageId::new("s1"), StageId::new("s2")];
        (Flow::new("F", stages.clone()), stages)
    }

    #[test]
    fn test_duplicate_starts_collapse_to_most_recent() {
        let (flow, stages) = two_stage_flow();
        let old = item(&stages[0], ActionKind::Entered, 60);
        let recent = item(&stages[0], ActionKind::Entered, 5);

        let kept = filter_for_display(vec![&old, &recent], Some(&flow), Some(0));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, recent.id);
    }

    #[test]
    fn test_exit_hidden_for_current_stage() {
        let (flow, stages) = two_stage_flow();
        let entered = item(&stages[0], ActionKind::Entered, 10);
        let exited = item(&stages[0], ActionKind::Exited, 5);

        // Stage 0 is current: its exit is noise, its start stays
        let kept = filter_for_display(vec![&entered, &exited], Some(&flow), Some(0));
        assert_eq!(kept.len(), 1);
        assert!(kept[0].kind.is_start());

        // Stage 0 is behind the current stage: both survive
        let kept = filter_for_display(vec![&entered, &exited], Some(&flow), Some(1));
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_future_stage_entries_hidden() {
        let (flow, stages) = two_stage_flow();
        let ahead = item(&stages[1], ActionKind::Entered, 5);

        let kept = filter_for_display(vec![&ahead], Some(&flow), Some(0));
        assert!(kept.is_empty());
    }

    #[test]
    fn test_other_kinds_pass_through() {
        let (flow, stages) = two_stage_flow();
        let post_1 = item(
            &stages[0],
            ActionKind::Post {
                message: "First comment".into(),
            },
            20,
        );
        let post_2 = item(
            &stages[0],
            ActionKind::Post {
                message: "Second comment".into(),
            },
            10,
        );

        let kept = filter_for_display(vec![&post_1, &post_2], Some(&flow), Some(0));
        assert_eq!(kept.len(), 2);
        // Chronological order preserved
        assert_eq!(kept[0].id, post_1.id);
        assert_eq!(kept[1].id, post_2.id);
    }

    #[test]
    fn test_reversion_sorts_by_embedded_timestamp() {
        let (flow, stages) = two_stage_flow();
        let reverted_at = Utc::now() - Duration::minutes(90);
        // Reversion recorded now but backdated before the post
        let reversion = item(&stages[0], ActionKind::Reverted { reverted_at }, 0);
        let post = item(
            &stages[0],
            ActionKind::Post {
                message: "Note".into(),
            },
            30,
        );

        let kept = filter_for_display(vec![&post, &reversion], Some(&flow), Some(0));
        assert_eq!(kept.len(), 2);
        assert!(kept[0].kind.is_start());
    }

    #[test]
    fn test_no_flow_position_hides_transitions() {
        let (_, stages) = two_stage_flow();
        let entered = item(&stages[0], ActionKind::Entered, 10);
        let post = item(
            &stages[0],
            ActionKind::Post {
                message: "Orphan".into(),
            },
            5,
        );

        let kept = filter_for_display(vec![&entered, &post], None, None);
        assert_eq!(kept.len(), 1);
        assert!(matches!(kept[0].kind, ActionKind::Post { .. }));
    }
}
