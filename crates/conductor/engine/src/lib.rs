//! Conductor workflow engine: the main entry point for contract renewals
//!
//! The engine coordinates a contract's progress through a flow. It:
//! 1. Registers stage and flow definitions
//! 2. Materializes ContractStage rows when a contract is assigned
//! 3. Advances, reverts, and completes contracts
//! 4. Switches contracts between flows without losing history
//! 5. Maintains the per-stage action log
//!
//! The engine never performs external I/O. Notification delivery, search
//! index refresh, and storage are the surrounding layer's job: every
//! mutating operation returns the action items it created so the caller
//! can compose notifications, and registered refresh hooks are told when
//! a contract changed so a search view can be refreshed eventually.

#![deny(unsafe_code)]

mod action_log;
mod contract_store;
mod engine;
mod flow_registry;
mod refresh;

pub use contract_store::ContractStore;
pub use engine::ConductorEngine;
pub use flow_registry::FlowRegistry;
pub use refresh::{RefreshEvent, RefreshHook};
