//! Flows: ordered stage sequences, the reusable workflow templates

use crate::{ConductorError, ConductorResult, FlowId, StageId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// An ordered sequence of stage ids a contract moves through.
///
/// Flows are templates: many contracts traverse the same flow, each with
/// its own ContractStage rows. Once any contract has traversed a flow the
/// stage order must not be mutated destructively; archive the flow and
/// create a new one instead.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Flow {
    /// Unique identifier
    pub id: FlowId,
    /// Unique human-readable name
    pub name: String,
    /// The stages, in traversal order. No duplicates.
    pub stage_order: Vec<StageId>,
    /// Archived flows are hidden from assignment but remain queryable
    pub is_archived: bool,
    /// When this flow was created
    pub created_at: DateTime<Utc>,
}

impl Flow {
    /// Create a new flow from an ordered stage list
    pub fn new(name: impl Into<String>, stage_order: Vec<StageId>) -> Self {
        Self {
            id: FlowId::generate(),
            name: name.into(),
            stage_order,
            is_archived: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: FlowId) -> Self {
        self.id = id;
        self
    }

    /// Validate the stage order: non-empty and duplicate-free.
    pub fn validate(&self) -> ConductorResult<()> {
        if self.stage_order.is_empty() {
            return Err(ConductorError::EmptyFlow(self.name.clone()));
        }
        let mut seen = HashSet::new();
        for stage_id in &self.stage_order {
            if !seen.insert(stage_id) {
                return Err(ConductorError::DuplicateStageInFlow {
                    flow: self.name.clone(),
                    stage: stage_id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Position of a stage within the flow, if it is a member
    pub fn position_of(&self, stage_id: &StageId) -> Option<usize> {
        self.stage_order.iter().position(|s| s == stage_id)
    }

    /// The first stage of the flow
    pub fn first_stage(&self) -> Option<&StageId> {
        self.stage_order.first()
    }

    /// The last stage of the flow
    pub fn last_stage(&self) -> Option<&StageId> {
        self.stage_order.last()
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.stage_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stage_order.is_empty()
    }

    /// Mark the flow archived. Archived flows cannot be assigned.
    pub fn archive(&mut self) {
        self.is_archived = true;
    }
}
