//! Error types for the conductor workflow

use crate::{ContractId, ContractStageKey, FlowId, StageId};

/// Errors that can occur in conductor operations
#[derive(Debug, thiserror::Error)]
pub enum ConductorError {
    #[error("Flow not found: {0}")]
    FlowNotFound(FlowId),

    #[error("Flow not found by name: {0}")]
    FlowNameNotFound(String),

    #[error("Stage not found: {0}")]
    StageNotFound(StageId),

    #[error("Contract not found: {0}")]
    ContractNotFound(ContractId),

    #[error("Contract stage not found: {0}")]
    ContractStageNotFound(ContractStageKey),

    #[error("Flow '{0}' has no stages")]
    EmptyFlow(String),

    #[error("Duplicate stage {stage} in flow '{flow}'")]
    DuplicateStageInFlow { flow: String, stage: StageId },

    #[error("A flow named '{0}' already exists")]
    DuplicateFlowName(String),

    #[error("Flow '{0}' is archived and cannot be assigned")]
    FlowArchived(String),

    #[error("Flow '{0}' has contract history; archive it instead of editing its stage order")]
    FlowInUse(String),

    #[error("Stage {stage} is not a member of flow {flow}")]
    StageNotInFlow { flow: FlowId, stage: StageId },

    #[error("Skipping stages is not supported (current index {current}, requested {requested})")]
    StageSkip { current: usize, requested: usize },

    #[error("Contract {0} is not assigned to a flow")]
    NotOnFlow(ContractId),

    #[error("Contract {0} is not a clone; nothing to extend")]
    NotAClone(ContractId),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Result type alias for conductor operations
pub type ConductorResult<T> = Result<T, ConductorError>;
