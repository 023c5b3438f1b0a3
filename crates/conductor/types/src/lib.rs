//! Domain types for the conductor contract workflow
//!
//! Conductor tracks municipal contracts through an ordered renewal
//! workflow. The data model:
//!
//! - **Stage**: a named step definition ("Legal Review").
//! - **Flow**: an ordered, duplicate-free sequence of stages: a reusable
//!   workflow template.
//! - **Contract**: the subject moved through a flow. Renewal work happens
//!   on a clone so the original survives as an archived historical record.
//! - **ContractStage**: one contract's occupancy of one stage within one
//!   flow, with enter/exit timestamps, compound-keyed by
//!   (contract, stage, flow).
//! - **ActionItem**: an audit log entry attached to a ContractStage.
//!   Payload shape is statically known per kind (`ActionKind`).
//!
//! # Design Principles
//!
//! 1. Entities reference each other by id, never by object graph. Lookups
//!    go through the engine's stores.
//! 2. Every mutating operation records who did it and when. The engine
//!    only records identity, it never authenticates.
//! 3. The action log is append-only from the application's perspective;
//!    deletion is an explicit user action, not a correction.

#![deny(unsafe_code)]

mod action;
mod contract;
mod contract_stage;
mod errors;
mod flow;
mod ids;
mod stage;

pub use action::*;
pub use contract::*;
pub use contract_stage::*;
pub use errors::*;
pub use flow::*;
pub use ids::*;
pub use stage::*;
