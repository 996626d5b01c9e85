//! Maps occurrence dates onto draft transactions for a recurring master.

use chrono::NaiveDate;
use tracing::{debug, warn};

use cashflow_domain::{Client, RecurrenceLink, RecurringMaster, Transaction};

use crate::{occurrence::generate_occurrence_dates, settlement::settlement_for_client, DEFAULT_MAX_MONTHS};

/// Drafts for the master's first window (`DEFAULT_MAX_MONTHS` when open-ended).
pub fn generate_transactions_from_master(
    master: &RecurringMaster,
    clients: &[Client],
    owner_id: &str,
) -> Vec<Transaction> {
    generate_transactions_within(master, clients, owner_id, DEFAULT_MAX_MONTHS)
}

/// Same as [`generate_transactions_from_master`] with an explicit window for
/// open-ended masters.
pub fn generate_transactions_within(
    master: &RecurringMaster,
    clients: &[Client],
    owner_id: &str,
    max_months: u32,
) -> Vec<Transaction> {
    let Some(start) = master.start_date else {
        debug!(master = %master.id, "master has no start date, nothing to generate");
        return Vec::new();
    };
    let dates = generate_occurrence_dates(start, master.end_date, &master.rule(), max_months);
    materialize_occurrences(master, &dates, clients, owner_id)
}

/// Builds one unsaved transaction per date. With a resolvable client the
/// settlement date follows its payment terms; otherwise it equals the date.
pub fn materialize_occurrences(
    master: &RecurringMaster,
    dates: &[NaiveDate],
    clients: &[Client],
    owner_id: &str,
) -> Vec<Transaction> {
    let client = master
        .client_id
        .and_then(|id| clients.iter().find(|client| client.id == id));
    if let (Some(client_id), None) = (master.client_id, client) {
        warn!(
            master = %master.id,
            client = %client_id,
            "client not found, settlement dates fall on occurrence dates"
        );
    }
    let memo = master.instance_memo();

    dates
        .iter()
        .map(|&date| Transaction {
            id: None,
            owner_id: owner_id.to_string(),
            kind: master.kind,
            amount: master.amount,
            title: master.title.clone(),
            memo: Some(memo.clone()),
            transaction_date: date,
            settlement_date: Some(
                client
                    .map(|client| settlement_for_client(date, client))
                    .unwrap_or(date),
            ),
            is_settled: false,
            is_detached: false,
            client_id: master.client_id,
            recurrence: Some(RecurrenceLink {
                master_id: master.id,
                instance_date: date,
            }),
            project_id: None,
            is_estimate: false,
        })
        .collect()
}
