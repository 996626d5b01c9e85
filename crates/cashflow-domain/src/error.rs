use chrono::NaiveDate;
use thiserror::Error;

/// Validation failures raised while constructing domain values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("settlement day must be 1-28 or 99 (month-end), got {0}")]
    InvalidSettlementDay(u32),
    #[error("payment month offset cannot be negative, got {0}")]
    NegativeMonthOffset(i64),
    #[error("day of period must be 1-31, got {0}")]
    InvalidDayOfPeriod(u32),
    #[error("month of year must be 1-12, got {0}")]
    InvalidMonthOfYear(u32),
    #[error("end date {end} precedes start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}
