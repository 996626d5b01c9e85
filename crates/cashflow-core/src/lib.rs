//! cashflow-core
//!
//! Settlement, recurrence, and recalculation engine for the cash-flow planner.
//! Depends on cashflow-domain. Pure calculations plus the traits the persistence
//! layer implements; no terminal I/O and no direct storage access.

pub mod error;
pub mod extension;
pub mod materializer;
pub mod occurrence;
pub mod projection;
pub mod recalculation;
pub mod settlement;
pub mod storage;
pub mod time;

pub use error::CoreError;
pub use extension::*;
pub use materializer::*;
pub use occurrence::*;
pub use projection::*;
pub use recalculation::*;
pub use settlement::*;
pub use storage::*;
pub use time::*;

pub use cashflow_domain::set_day_with_month_end_fallback;
