//! CLI command implementations

pub mod metrics;
pub mod seed;
