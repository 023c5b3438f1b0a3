//! Refresh hooks: on-write observer registration
//!
//! The full-text search view over contracts is maintained outside this
//! engine. The engine's only obligation is to signal that a contract
//! changed; delivery is fire-and-forget and eventually consistent, so
//! hooks must never fail the operation that triggered them.

use conductor_types::ContractId;

/// A contract-mutating event worth refreshing derived views for
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshEvent {
    /// A contract's workflow state changed (assign, transition, switch)
    ContractChanged(ContractId),
    /// A contract completed and its lineage was re-pointed
    ContractCompleted(ContractId),
    /// A contract was deleted (extend kills the clone)
    ContractDeleted(ContractId),
}

/// Observer notified after contract-mutating operations
pub trait RefreshHook {
    fn on_write(&self, event: &RefreshEvent);
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every event it sees, for assertions
    pub struct RecordingHook {
        pub events: Rc<RefCell<Vec<RefreshEvent>>>,
    }

    impl RefreshHook for RecordingHook {
        fn on_write(&self, event: &RefreshEvent) {
            self.events.borrow_mut().push(event.clone());
        }
    }
}
