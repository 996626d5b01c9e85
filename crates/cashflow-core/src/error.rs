use cashflow_domain::DomainError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(#[from] DomainError),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(Uuid),
    #[error("Project not found: {0}")]
    ProjectNotFound(Uuid),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
