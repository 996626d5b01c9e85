use cashflow_config::ConfigError;
use cashflow_core::CoreError;
use cashflow_domain::DomainError;
use thiserror::Error;

/// Error type surfaced by the planner facade and the CLI.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Validation error: {0}")]
    Domain(#[from] DomainError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("{0}")]
    Usage(String),
    #[error("Recalculation failed: {0}")]
    Recalculation(String),
}

pub type Result<T> = std::result::Result<T, PlannerError>;
