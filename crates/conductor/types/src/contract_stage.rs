//! ContractStage: one contract's occupancy of one stage within one flow
//!
//! Rows are compound-keyed by (contract, stage, flow); the key doubles
//! as the idempotency check when stage rows are materialized. A surrogate
//! sequence number records creation order.

use crate::{ContractId, FlowId, StageId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Compound key identifying a ContractStage row
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractStageKey {
    pub contract_id: ContractId,
    pub stage_id: StageId,
    pub flow_id: FlowId,
}

impl ContractStageKey {
    pub fn new(contract_id: ContractId, stage_id: StageId, flow_id: FlowId) -> Self {
        Self {
            contract_id,
            stage_id,
            flow_id,
        }
    }
}

impl std::fmt::Display for ContractStageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.contract_id.short(),
            self.flow_id.short(),
            self.stage_id.short()
        )
    }
}

/// The lifecycle record of a contract within a single stage.
///
/// Invariants:
/// - At most one row per contract has `entered` set and `exited` unset
///   (the active stage).
/// - `exited` is only ever set after `entered`.
/// - A full revert clears both timestamps, logically undoing progress.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContractStage {
    /// Surrogate sequence id, assigned by the store in creation order
    pub sequence: u64,
    /// Compound key
    pub key: ContractStageKey,
    /// When the contract entered this stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entered: Option<DateTime<Utc>>,
    /// When the contract exited this stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exited: Option<DateTime<Utc>>,
}

impl ContractStage {
    pub fn new(sequence: u64, key: ContractStageKey) -> Self {
        Self {
            sequence,
            key,
            entered: None,
            exited: None,
        }
    }

    /// Enter the stage at the given time, clearing any previous exit.
    pub fn enter(&mut self, at: DateTime<Utc>) {
        self.entered = Some(at);
        self.exited = None;
    }

    /// Exit the stage at the given time. Only meaningful after `enter`.
    pub fn exit(&mut self, at: DateTime<Utc>) {
        self.exited = Some(at);
    }

    /// Clear both timestamps, undoing all progress through this stage.
    pub fn full_revert(&mut self) {
        self.entered = None;
        self.exited = None;
    }

    /// The contract is currently occupying this stage
    pub fn is_current(&self) -> bool {
        self.entered.is_some() && self.exited.is_none()
    }

    /// The contract has passed through this stage
    pub fn is_exited(&self) -> bool {
        self.entered.is_some() && self.exited.is_some()
    }

    /// Time spent in the stage, if both timestamps are set
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.entered, self.exited) {
            (Some(entered), Some(exited)) => Some(exited - entered),
            _ => None,
        }
    }
}
