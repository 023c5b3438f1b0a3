//! Stage definitions: the named steps a flow is built from

use crate::StageId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named step definition, e.g. "Legal Review".
///
/// Stages are leaf entities: flows reference them by id, and a stage is
/// never deleted while an active flow references it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Stage {
    /// Unique identifier
    pub id: StageId,
    /// Human-readable name
    pub name: String,
    /// Whether entering this stage should publish a procurement
    /// opportunity to subscribed vendors
    pub post_opportunities: bool,
    /// Default message body offered when notifying from this stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_message: Option<String>,
    /// When this stage was created
    pub created_at: DateTime<Utc>,
}

impl Stage {
    /// Create a new stage definition
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: StageId::generate(),
            name: name.into(),
            post_opportunities: false,
            default_message: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: StageId) -> Self {
        self.id = id;
        self
    }

    pub fn with_post_opportunities(mut self, post: bool) -> Self {
        self.post_opportunities = post;
        self
    }

    pub fn with_default_message(mut self, message: impl Into<String>) -> Self {
        self.default_message = Some(message.into());
        self
    }
}
