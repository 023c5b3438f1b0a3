//! Action items: the audit log attached to contract stages
//!
//! Every state change a contract goes through is recorded as an
//! ActionItem on the ContractStage where it happened. The payload shape
//! is statically known per kind, so downstream consumers never have to
//! guess what a loosely-typed detail dict contains.

use crate::{ActionItemId, ContractStageKey, FlowId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What happened, with the payload that kind of event carries
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ActionKind {
    /// The contract entered the stage
    Entered,
    /// The contract exited the stage
    Exited,
    /// The stage was reopened by a backward revert. The embedded
    /// timestamp is the revert time and doubles as the sort key so a
    /// reopened stage displays at its new position in the log.
    #[serde(rename = "reversion")]
    Reverted { reverted_at: DateTime<Utc> },
    /// A free-form note left by a user
    Activity { note: String },
    /// A single contract field was updated
    Update { field: String, value: String },
    /// An opportunity post was published from this stage
    Post { message: String },
    /// Contract metadata changed (field name → new value)
    UpdateMetadata { changes: BTreeMap<String, String> },
    /// The contract was moved to a different flow. The old flow's
    /// filtered action log survives only inside this payload.
    #[serde(rename = "flow_switch")]
    FlowSwitch {
        old_flow_id: FlowId,
        old_flow_name: String,
        new_flow_name: String,
        old_flow_actions: serde_json::Value,
    },
}

impl ActionKind {
    /// Stable label used in exports and log rendering
    pub fn label(&self) -> &'static str {
        match self {
            Self::Entered => "entered",
            Self::Exited => "exited",
            Self::Reverted { .. } => "reversion",
            Self::Activity { .. } => "activity",
            Self::Update { .. } => "update",
            Self::Post { .. } => "post",
            Self::UpdateMetadata { .. } => "update-metadata",
            Self::FlowSwitch { .. } => "flow_switch",
        }
    }

    /// Start-of-stage events: an entry or a reopen after revert
    pub fn is_start(&self) -> bool {
        matches!(self, Self::Entered | Self::Reverted { .. })
    }

    /// End-of-stage events
    pub fn is_exit(&self) -> bool {
        matches!(self, Self::Exited)
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One entry in a contract stage's audit log.
///
/// Append-only from the application's perspective: entries are only
/// removed by explicit user deletion or by the flow-switch history wipe,
/// never as a correction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionItem {
    /// Unique identifier
    pub id: ActionItemId,
    /// The contract stage this entry belongs to
    pub contract_stage: ContractStageKey,
    /// What happened
    pub kind: ActionKind,
    /// Who did it. None when the user was since deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taken_by: Option<UserId>,
    /// When the entry was recorded
    pub taken_at: DateTime<Utc>,
}

impl ActionItem {
    pub fn new(contract_stage: ContractStageKey, kind: ActionKind) -> Self {
        Self {
            id: ActionItemId::generate(),
            contract_stage,
            kind,
            taken_at: Utc::now(),
            taken_by: None,
        }
    }

    pub fn with_taken_by(mut self, user: UserId) -> Self {
        self.taken_by = Some(user);
        self
    }

    pub fn with_taken_at(mut self, at: DateTime<Utc>) -> Self {
        self.taken_at = at;
        self
    }

    /// Chronological sort key. Reversion entries sort by the revert
    /// time embedded in their payload; everything else by `taken_at`.
    pub fn sort_key(&self) -> DateTime<Utc> {
        match &self.kind {
            ActionKind::Reverted { reverted_at } => *reverted_at,
            _ => self.taken_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ContractId, StageId};

    fn make_key() -> ContractStageKey {
        ContractStageKey::new(
            ContractId::new("c1"),
            StageId::new("s1"),
            FlowId::new("f1"),
        )
    }

    #[test]
    fn test_labels() {
        assert_eq!(ActionKind::Entered.label(), "entered");
        assert_eq!(
            ActionKind::Reverted {
                reverted_at: Utc::now()
            }
            .label(),
            "reversion"
        );
        assert_eq!(
            ActionKind::UpdateMetadata {
                changes: BTreeMap::new()
            }
            .label(),
            "update-metadata"
        );
    }

    #[test]
    fn test_start_exit_classification() {
        assert!(ActionKind::Entered.is_start());
        assert!(ActionKind::Reverted {
            reverted_at: Utc::now()
        }
        .is_start());
        assert!(ActionKind::Exited.is_exit());
        assert!(!ActionKind::Activity {
            note: "called vendor".into()
        }
        .is_start());
    }

    #[test]
    fn test_sort_key_uses_embedded_revert_time() {
        let revert_time = Utc::now() - chrono::Duration::days(3);
        let item = ActionItem::new(
            make_key(),
            ActionKind::Reverted {
                reverted_at: revert_time,
            },
        );
        assert_eq!(item.sort_key(), revert_time);
        assert_ne!(item.sort_key(), item.taken_at);

        let plain = ActionItem::new(make_key(), ActionKind::Entered);
        assert_eq!(plain.sort_key(), plain.taken_at);
    }

    #[test]
    fn test_serde_tagging() {
        let item = ActionItem::new(
            make_key(),
            ActionKind::Update {
                field: "description".into(),
                value: "Rock salt".into(),
            },
        )
        .with_taken_by(UserId::new("u1"));

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["kind"]["type"], "update");
        assert_eq!(json["kind"]["field"], "description");
        assert_eq!(json["taken_by"], "u1");
    }
}
