#![doc(test(attr(deny(warnings))))]

//! Cash-flow planner: settlement dates from client payment terms, recurring
//! transaction materialization with rolling extension, and settlement
//! recalculation when project end dates move.
//!
//! The engine lives in `cashflow-core`; this crate wires it to configuration,
//! JSON persistence, a system clock, and the `cashflow_cli` front end.

pub mod cli;
pub mod errors;
pub mod planner;
pub mod system_clock;
pub mod utils;

pub use cashflow_config as config;
pub use cashflow_core as core;
pub use cashflow_domain as domain;
pub use cashflow_storage_json as storage;

pub use errors::{PlannerError, Result};
pub use planner::{CashFlowPlanner, ExtensionReport};
pub use system_clock::SystemClock;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Cash-flow planner tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
