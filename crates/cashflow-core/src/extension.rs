//! Rolls the generated horizon of open-ended masters forward over time.

use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

use cashflow_domain::{add_months, Client, RecurringMaster, StartOfDay, Transaction};

use crate::{
    materializer::{generate_transactions_from_master, materialize_occurrences},
    occurrence::{calculate_next_occurrence, generate_occurrence_dates, DEFAULT_MAX_MONTHS},
};

pub const DEFAULT_THRESHOLD_MONTHS: u32 = 6;
pub const DEFAULT_EXTENSION_MONTHS: u32 = 12;

/// Window sizes that govern initial generation and later extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceHorizon {
    pub initial_months: u32,
    /// Extend once the latest instance is closer than this to today.
    pub threshold_months: u32,
    pub extension_months: u32,
}

impl Default for RecurrenceHorizon {
    fn default() -> Self {
        Self {
            initial_months: DEFAULT_MAX_MONTHS,
            threshold_months: DEFAULT_THRESHOLD_MONTHS,
            extension_months: DEFAULT_EXTENSION_MONTHS,
        }
    }
}

/// Latest original schedule date among the instances of `master_id`.
pub fn latest_instance_date(master_id: Uuid, transactions: &[Transaction]) -> Option<NaiveDate> {
    transactions
        .iter()
        .filter(|txn| txn.is_instance_of(master_id))
        .filter_map(Transaction::recurring_instance_date)
        .max()
}

/// Whether an active, open-ended master needs more instances generated.
/// `reference` is "now"; extension is due when the horizon ends before
/// `reference + threshold_months`.
pub fn needs_auto_extension(
    master: &RecurringMaster,
    transactions: &[Transaction],
    reference: impl StartOfDay,
    threshold_months: u32,
) -> bool {
    if !master.is_open_ended() || !master.is_active {
        return false;
    }
    match latest_instance_date(master.id, transactions) {
        None => true,
        Some(latest) => {
            let threshold = add_months(reference.start_of_day(), threshold_months);
            latest < threshold
        }
    }
}

/// Drafts continuing the master right after its latest instance, covering
/// `extension_months`. Without existing instances this is the master's initial
/// window, whatever `extension_months` is.
pub fn generate_extension_transactions(
    master: &RecurringMaster,
    existing: &[Transaction],
    clients: &[Client],
    owner_id: &str,
    extension_months: u32,
) -> Vec<Transaction> {
    let Some(latest) = latest_instance_date(master.id, existing) else {
        return generate_transactions_from_master(master, clients, owner_id);
    };
    let next = calculate_next_occurrence(latest, &master.rule());
    if master.end_date.is_some_and(|end| next > end) {
        debug!(master = %master.id, %next, "next occurrence is past the end date");
        return Vec::new();
    }
    let dates = generate_occurrence_dates(next, master.end_date, &master.rule(), extension_months);
    info!(
        master = %master.id,
        from = %next,
        count = dates.len(),
        "extending recurring master"
    );
    materialize_occurrences(master, &dates, clients, owner_id)
}
