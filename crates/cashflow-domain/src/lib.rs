//! cashflow-domain
//!
//! Pure domain models (Client, Transaction, RecurringMaster, Project) and calendar helpers.
//! No I/O, no storage. Only data types, validation, and core enums.

pub mod calendar;
pub mod client;
pub mod common;
pub mod error;
pub mod project;
pub mod recurring;
pub mod transaction;

pub use calendar::*;
pub use client::*;
pub use common::*;
pub use error::DomainError;
pub use project::*;
pub use recurring::*;
pub use transaction::*;
