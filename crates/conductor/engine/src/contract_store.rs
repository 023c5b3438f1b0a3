//! Contract store: arena-and-index repository for contracts, stage rows,
//! and the action log
//!
//! Entities reference each other by id; all navigation goes through
//! explicit lookups here. The compound key (contract, stage, flow) on
//! ContractStage rows is the idempotency mechanism: materializing stages
//! twice finds the existing rows instead of failing, surfaced to callers
//! as an explicit `(key, created)` pair rather than a caught constraint
//! violation.

use conductor_types::{
    ActionItem, ConductorError, ConductorResult, Contract, ContractId, ContractStage,
    ContractStageKey, FlowId,
};
use std::collections::HashMap;

/// Repository for contracts and their workflow state
#[derive(Clone, Debug, Default)]
pub struct ContractStore {
    /// All contracts, keyed by id
    contracts: HashMap<ContractId, Contract>,
    /// Stage rows, keyed by the compound (contract, stage, flow) key
    stage_rows: HashMap<ContractStageKey, ContractStage>,
    /// Next surrogate sequence for stage rows (creation order)
    next_sequence: u64,
    /// The action log, append-ordered
    actions: Vec<ActionItem>,
}

impl ContractStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    // ── Contracts ────────────────────────────────────────────────────

    /// Insert a contract, returning its id
    pub fn insert_contract(&mut self, contract: Contract) -> ContractId {
        let id = contract.id.clone();
        tracing::info!(contract_id = %id, "Contract stored");
        self.contracts.insert(id.clone(), contract);
        id
    }

    /// Get a contract by id
    pub fn contract(&self, id: &ContractId) -> ConductorResult<&Contract> {
        self.contracts
            .get(id)
            .ok_or_else(|| ConductorError::ContractNotFound(id.clone()))
    }

    /// Get a mutable contract by id
    pub fn contract_mut(&mut self, id: &ContractId) -> ConductorResult<&mut Contract> {
        self.contracts
            .get_mut(id)
            .ok_or_else(|| ConductorError::ContractNotFound(id.clone()))
    }

    /// All contracts cloned from the given one
    pub fn children_of(&self, id: &ContractId) -> Vec<ContractId> {
        self.contracts
            .values()
            .filter(|c| c.parent_id.as_ref() == Some(id))
            .map(|c| c.id.clone())
            .collect()
    }

    /// Contracts visible in primary workflow lists
    pub fn active_contracts(&self) -> Vec<&Contract> {
        self.contracts
            .values()
            .filter(|c| !c.is_archived)
            .collect()
    }

    /// Delete a contract, cascading to its stage rows and their action
    /// log entries.
    pub fn delete_contract(&mut self, id: &ContractId) -> ConductorResult<Contract> {
        let contract = self
            .contracts
            .remove(id)
            .ok_or_else(|| ConductorError::ContractNotFound(id.clone()))?;
        self.stage_rows.retain(|key, _| &key.contract_id != id);
        self.actions
            .retain(|a| &a.contract_stage.contract_id != id);
        tracing::info!(contract_id = %id, "Contract deleted with stage rows and log");
        Ok(contract)
    }

    // ── Stage rows ───────────────────────────────────────────────────

    /// Get or create the stage row for a compound key.
    ///
    /// Returns `created = false` when the row already existed, the
    /// signal that this contract has traversed (part of) this flow
    /// before and revert semantics apply.
    pub fn get_or_create_stage(&mut self, key: ContractStageKey) -> (ContractStageKey, bool) {
        if self.stage_rows.contains_key(&key) {
            return (key, false);
        }
        self.next_sequence += 1;
        let row = ContractStage::new(self.next_sequence, key.clone());
        tracing::trace!(stage_row = %key, sequence = row.sequence, "Stage row created");
        self.stage_rows.insert(key.clone(), row);
        (key, true)
    }

    /// Get a stage row by compound key
    pub fn stage_row(&self, key: &ContractStageKey) -> ConductorResult<&ContractStage> {
        self.stage_rows
            .get(key)
            .ok_or_else(|| ConductorError::ContractStageNotFound(key.clone()))
    }

    /// Get a mutable stage row by compound key
    pub fn stage_row_mut(&mut self, key: &ContractStageKey) -> ConductorResult<&mut ContractStage> {
        self.stage_rows
            .get_mut(key)
            .ok_or_else(|| ConductorError::ContractStageNotFound(key.clone()))
    }

    /// All stage rows for a contract, in creation order
    pub fn stage_rows_for_contract(&self, id: &ContractId) -> Vec<&ContractStage> {
        let mut rows: Vec<&ContractStage> = self
            .stage_rows
            .values()
            .filter(|r| &r.key.contract_id == id)
            .collect();
        rows.sort_by_key(|r| r.sequence);
        rows
    }

    /// Stage rows for a contract under one flow, in creation order
    pub fn stage_rows_for_contract_flow(
        &self,
        id: &ContractId,
        flow_id: &FlowId,
    ) -> Vec<&ContractStage> {
        let mut rows: Vec<&ContractStage> = self
            .stage_rows
            .values()
            .filter(|r| &r.key.contract_id == id && &r.key.flow_id == flow_id)
            .collect();
        rows.sort_by_key(|r| r.sequence);
        rows
    }

    /// The row the contract currently occupies (entered, not exited)
    pub fn current_stage_row(&self, id: &ContractId) -> Option<&ContractStage> {
        self.stage_rows
            .values()
            .find(|r| &r.key.contract_id == id && r.is_current())
    }

    /// Whether any contract history references the flow
    pub fn flow_has_history(&self, flow_id: &FlowId) -> bool {
        self.stage_rows.values().any(|r| &r.key.flow_id == flow_id)
    }

    // ── Action log ───────────────────────────────────────────────────

    /// Append an action log entry
    pub fn record_action(&mut self, item: ActionItem) -> &ActionItem {
        tracing::trace!(
            stage_row = %item.contract_stage,
            kind = %item.kind,
            "Action recorded"
        );
        self.actions.push(item);
        self.actions.last().expect("just pushed")
    }

    /// All log entries for one stage row, in append order
    pub fn actions_for_stage(&self, key: &ContractStageKey) -> Vec<&ActionItem> {
        self.actions
            .iter()
            .filter(|a| &a.contract_stage == key)
            .collect()
    }

    /// All log entries for a contract, in append order
    pub fn actions_for_contract(&self, id: &ContractId) -> Vec<&ActionItem> {
        self.actions
            .iter()
            .filter(|a| &a.contract_stage.contract_id == id)
            .collect()
    }

    /// Delete a stage row's log entries, keeping flow-switch markers.
    /// Used when a contract leaves a flow so stale history does not
    /// bleed into the new flow's display.
    pub fn strip_stage_actions(&mut self, key: &ContractStageKey) {
        self.actions.retain(|a| {
            &a.contract_stage != key
                || matches!(a.kind, conductor_types::ActionKind::FlowSwitch { .. })
        });
    }

    /// Explicit user deletion of a single log entry
    pub fn delete_action(&mut self, id: &conductor_types::ActionItemId) -> bool {
        let before = self.actions.len();
        self.actions.retain(|a| &a.id != id);
        self.actions.len() != before
    }
}
