//! Flow registry: stores and retrieves stage and flow definitions
//!
//! Definitions are validated before they are stored. Flows referenced by
//! contract history are never deleted, only archived; stages are never
//! deleted while a flow references them.

use conductor_types::{ConductorError, ConductorResult, Flow, FlowId, Stage, StageId};
use std::collections::HashMap;

/// Registry of stage and flow definitions
#[derive(Clone, Debug, Default)]
pub struct FlowRegistry {
    /// All stage definitions, keyed by id
    stages: HashMap<StageId, Stage>,
    /// All flow definitions, keyed by id
    flows: HashMap<FlowId, Flow>,
    /// Index by unique flow name
    by_name: HashMap<String, FlowId>,
}

impl FlowRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    // ── Stages ───────────────────────────────────────────────────────

    /// Register a stage definition
    pub fn register_stage(&mut self, stage: Stage) -> StageId {
        let id = stage.id.clone();
        tracing::info!(stage_id = %id, name = %stage.name, "Stage registered");
        self.stages.insert(id.clone(), stage);
        id
    }

    /// Get a stage by id
    pub fn stage(&self, id: &StageId) -> ConductorResult<&Stage> {
        self.stages
            .get(id)
            .ok_or_else(|| ConductorError::StageNotFound(id.clone()))
    }

    /// Find a stage by name
    pub fn stage_by_name(&self, name: &str) -> Option<&Stage> {
        self.stages.values().find(|s| s.name == name)
    }

    /// List all stage definitions
    pub fn list_stages(&self) -> Vec<&Stage> {
        self.stages.values().collect()
    }

    // ── Flows ────────────────────────────────────────────────────────

    /// Register a flow definition.
    ///
    /// Validates the stage order, rejects duplicate names, and checks
    /// that every referenced stage exists. Returns the flow id.
    pub fn register_flow(&mut self, flow: Flow) -> ConductorResult<FlowId> {
        flow.validate()?;
        if self.by_name.contains_key(&flow.name) {
            return Err(ConductorError::DuplicateFlowName(flow.name.clone()));
        }
        for stage_id in &flow.stage_order {
            self.stage(stage_id)?;
        }

        let id = flow.id.clone();
        self.by_name.insert(flow.name.clone(), id.clone());
        tracing::info!(flow_id = %id, name = %flow.name, stages = flow.len(), "Flow registered");
        self.flows.insert(id.clone(), flow);
        Ok(id)
    }

    /// Get a flow by id
    pub fn flow(&self, id: &FlowId) -> ConductorResult<&Flow> {
        self.flows
            .get(id)
            .ok_or_else(|| ConductorError::FlowNotFound(id.clone()))
    }

    /// Get a flow by its unique name
    pub fn flow_by_name(&self, name: &str) -> ConductorResult<&Flow> {
        let id = self
            .by_name
            .get(name)
            .ok_or_else(|| ConductorError::FlowNameNotFound(name.to_string()))?;
        self.flow(id)
    }

    /// List all flows, archived included
    pub fn list_flows(&self) -> Vec<&Flow> {
        self.flows.values().collect()
    }

    /// List flows available for assignment
    pub fn active_flows(&self) -> Vec<&Flow> {
        self.flows.values().filter(|f| !f.is_archived).collect()
    }

    /// Archive a flow. Archived flows cannot be assigned to contracts
    /// but remain queryable for historical data.
    pub fn archive_flow(&mut self, id: &FlowId) -> ConductorResult<()> {
        let flow = self
            .flows
            .get_mut(id)
            .ok_or_else(|| ConductorError::FlowNotFound(id.clone()))?;
        flow.archive();
        tracing::info!(flow_id = %id, name = %flow.name, "Flow archived");
        Ok(())
    }

    /// Replace a flow's stage order. The caller is responsible for
    /// checking that no contract history references the flow.
    pub(crate) fn set_stage_order(
        &mut self,
        id: &FlowId,
        stage_order: Vec<StageId>,
    ) -> ConductorResult<()> {
        for stage_id in &stage_order {
            self.stage(stage_id)?;
        }
        let flow = self
            .flows
            .get_mut(id)
            .ok_or_else(|| ConductorError::FlowNotFound(id.clone()))?;
        let candidate = Flow {
            stage_order,
            ..flow.clone()
        };
        candidate.validate()?;
        *flow = candidate;
        Ok(())
    }
}
