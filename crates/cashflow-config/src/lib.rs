//! cashflow-config
//!
//! Persistent planner configuration: data location, default owner, and
//! recurrence horizon settings, plus disk persistence helpers.

pub mod error;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use manager::ConfigManager;
pub use model::{Config, RecurrenceSettings};
