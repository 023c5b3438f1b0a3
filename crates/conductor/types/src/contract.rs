//! Contracts: the subjects moved through a flow
//!
//! Only the workflow-relevant fields live here. Renewal work never
//! mutates a contract in place: the contract is cloned, the clone
//! becomes the work subject, and the original is preserved (and later
//! archived) with all of its historical stage rows and action log.

use crate::{ContractId, FlowId, StageId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Suffix appended to an archived contract's description
pub const ARCHIVED_SUFFIX: &str = " [Archived]";

/// A contract being tracked through a renewal workflow
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Contract {
    /// Unique identifier
    pub id: ContractId,
    /// Human-readable description of the contract
    pub description: String,
    /// The flow this contract is assigned to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_id: Option<FlowId>,
    /// The stage the contract currently occupies within its flow.
    /// `None` means not started (or completed and archived).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_stage_id: Option<StageId>,
    /// The contract this one was cloned from, if it is a clone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ContractId>,
    /// The user responsible for driving this contract's renewal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<UserId>,
    /// Users following this contract (notified on stage changes)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub followers: Vec<UserId>,
    /// Hidden contracts do not appear in vendor-facing listings
    pub is_visible: bool,
    /// Archived contracts are hidden from primary workflow lists but
    /// remain queryable
    pub is_archived: bool,
    /// When this contract record was created
    pub created_at: DateTime<Utc>,
    /// When this contract was last updated
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    /// Create a new contract
    pub fn new(description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ContractId::generate(),
            description: description.into(),
            flow_id: None,
            current_stage_id: None,
            parent_id: None,
            assigned_to: None,
            followers: Vec::new(),
            is_visible: true,
            is_archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(mut self, id: ContractId) -> Self {
        self.id = id;
        self
    }

    pub fn with_follower(mut self, user: UserId) -> Self {
        self.followers.push(user);
        self
    }

    /// Clone this contract as the new work subject for renewal.
    ///
    /// The clone starts fresh: no flow, no current stage, hidden until
    /// the original completes. The original keeps its history.
    pub fn clone_for_renewal(&self) -> Self {
        let now = Utc::now();
        Self {
            id: ContractId::generate(),
            description: self.description.clone(),
            flow_id: None,
            current_stage_id: None,
            parent_id: Some(self.id.clone()),
            assigned_to: None,
            followers: Vec::new(),
            is_visible: false,
            is_archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this contract is a clone of another
    pub fn is_clone(&self) -> bool {
        self.parent_id.is_some()
    }

    /// Archive the contract: hide it and mark its description.
    ///
    /// The suffix is appended at most once, so archiving is idempotent.
    pub fn archive(&mut self) {
        self.is_visible = false;
        self.is_archived = true;
        if !self.description.ends_with(ARCHIVED_SUFFIX) {
            self.description.push_str(ARCHIVED_SUFFIX);
        }
        self.touch();
    }

    /// Make the contract the active record again, stripping the
    /// archived marker if present.
    pub fn reactivate(&mut self) {
        self.is_visible = true;
        self.is_archived = false;
        if let Some(stripped) = self.description.strip_suffix(ARCHIVED_SUFFIX) {
            self.description = stripped.to_string();
        }
        self.touch();
    }

    /// Add a follower if not already present
    pub fn add_follower(&mut self, user: UserId) {
        if !self.followers.contains(&user) {
            self.followers.push(user);
            self.touch();
        }
    }

    /// Remove a follower
    pub fn remove_follower(&mut self, user: &UserId) {
        self.followers.retain(|u| u != user);
        self.touch();
    }

    /// Stamp the update time
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
