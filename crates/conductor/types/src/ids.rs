//! Identifier newtypes for the conductor domain
//!
//! All entities are referenced by id; there is no bidirectional object
//! graph. A macro keeps the newtypes uniform: `generate()` for fresh v4
//! uuids, `new()` for fixed ids (tests, seeds), `short()` for display.

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn short(&self) -> &str {
                &self.0[..8.min(self.0.len())]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type! {
    /// Unique identifier for a stage definition
    StageId
}

id_type! {
    /// Unique identifier for a flow (workflow template)
    FlowId
}

id_type! {
    /// Unique identifier for a contract
    ContractId
}

id_type! {
    /// Unique identifier for an action log entry
    ActionItemId
}

id_type! {
    /// Identity of the user an action is attributed to
    UserId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_unique() {
        let a = ContractId::generate();
        let b = ContractId::generate();
        assert_ne!(a, b);
        assert!(!a.0.is_empty());
    }

    #[test]
    fn test_short_and_display() {
        let id = FlowId::new("renewal-flow-2026");
        assert_eq!(id.short(), "renewal-");
        assert_eq!(format!("{}", id), "renewal-flow-2026");

        let tiny = StageId::new("s1");
        assert_eq!(tiny.short(), "s1");
    }
}
