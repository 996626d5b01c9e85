//! Re-derives settlement dates of a project's income when its end date moves.
//!
//! Settled and detached transactions are never proposed for update. All
//! accepted changes are staged into one [`UpdateBatch`] and committed by the
//! store as a single unit.

use std::fmt;

use chrono::NaiveDate;
use tracing::{info, warn};
use uuid::Uuid;

use cashflow_domain::{Client, Displayable, Mutability, Project, Transaction, TransactionKind};

use crate::{
    settlement::settlement_for_client,
    storage::{FieldChange, TransactionStore, UpdateBatch},
};

/// Why a candidate transaction was left alone. Expected outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    Settled,
    Detached,
    NoClient,
    ClientNotFound,
    /// The record came back from the store without an identity.
    Unidentified,
}

impl SkipReason {
    pub fn code(self) -> &'static str {
        match self {
            SkipReason::Settled => "settled",
            SkipReason::Detached => "detached",
            SkipReason::NoClient => "no_client",
            SkipReason::ClientNotFound => "client_not_found",
            SkipReason::Unidentified => "unidentified",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SkipReason::Settled => "already settled (settlement lock)",
            SkipReason::Detached => "manually edited (detached from its rule)",
            SkipReason::NoClient => "project has no client, settlement cannot be computed",
            SkipReason::ClientNotFound => "project client not found, settlement cannot be computed",
            SkipReason::Unidentified => "record has no identity",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedTransaction {
    pub transaction_id: Option<Uuid>,
    pub reason: SkipReason,
}

/// Outcome reported to the caller, including partial-success details.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecalculationResult {
    pub success: bool,
    pub updated_count: usize,
    pub skipped_count: usize,
    pub warnings: Vec<String>,
    pub skipped: Vec<SkippedTransaction>,
}

impl RecalculationResult {
    fn skip(&mut self, transaction: &Transaction, reason: SkipReason) {
        self.skipped_count += 1;
        self.skipped.push(SkippedTransaction {
            transaction_id: transaction.id,
            reason,
        });
        self.warnings.push(format!(
            "Skipped {}: {}",
            transaction.display_label(),
            reason
        ));
    }

    fn failed(mut self, message: String) -> Self {
        self.success = false;
        self.updated_count = 0;
        self.warnings.push(message);
        self
    }

    /// One-line summary such as "3 updated, 2 skipped".
    pub fn summary(&self) -> String {
        format!(
            "{} updated, {} skipped",
            self.updated_count, self.skipped_count
        )
    }
}

/// Staged changes plus the report they produce once committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecalculationPlan {
    pub batch: UpdateBatch,
    pub result: RecalculationResult,
}

/// Applies the guards in order and returns the client to settle against.
pub fn check_guards<'a>(
    transaction: &Transaction,
    project: &Project,
    clients: &'a [Client],
) -> Result<&'a Client, SkipReason> {
    match transaction.mutability() {
        Mutability::Settled => return Err(SkipReason::Settled),
        Mutability::Detached => return Err(SkipReason::Detached),
        Mutability::Editable => {}
    }
    let client_id = project.client_id.ok_or(SkipReason::NoClient)?;
    clients
        .iter()
        .find(|client| client.id == client_id)
        .ok_or(SkipReason::ClientNotFound)
}

/// Decides, without touching storage, what a recalculation would change.
pub fn plan_recalculation(
    project: &Project,
    new_end_date: NaiveDate,
    candidates: &[Transaction],
    clients: &[Client],
) -> RecalculationPlan {
    let mut batch = UpdateBatch::new();
    let mut result = RecalculationResult {
        success: true,
        ..RecalculationResult::default()
    };

    for transaction in candidates {
        let client = match check_guards(transaction, project, clients) {
            Ok(client) => client,
            Err(reason) => {
                warn!(
                    project = %project.id,
                    transaction = ?transaction.id,
                    reason = reason.code(),
                    "skipping settlement recalculation"
                );
                result.skip(transaction, reason);
                continue;
            }
        };
        let Some(id) = transaction.id else {
            result.skip(transaction, SkipReason::Unidentified);
            continue;
        };
        let settlement = settlement_for_client(new_end_date, client);
        batch.stage(
            id,
            vec![
                FieldChange::TransactionDate(new_end_date),
                FieldChange::SettlementDate(settlement),
            ],
        );
        result.updated_count += 1;
    }

    RecalculationPlan { batch, result }
}

/// Recomputes the settlement of every income transaction linked to `project`
/// using `new_end_date` as the accrual date, and commits the changes atomically.
pub fn recalculate_settlement(
    store: &dyn TransactionStore,
    owner_id: &str,
    project: &Project,
    new_end_date: NaiveDate,
    clients: &[Client],
) -> RecalculationResult {
    let candidates = match store.income_by_project(owner_id, project.id) {
        Ok(found) => found
            .into_iter()
            .filter(|txn| txn.kind == TransactionKind::Income)
            .collect::<Vec<_>>(),
        Err(err) => {
            warn!(project = %project.id, error = %err, "failed to load project transactions");
            return RecalculationResult::default()
                .failed(format!("Failed to load transactions for {}: {err}", project.display_label()));
        }
    };

    if candidates.is_empty() {
        return RecalculationResult {
            success: true,
            warnings: vec![format!(
                "No income transactions are linked to {}; nothing to recalculate",
                project.display_label()
            )],
            ..RecalculationResult::default()
        };
    }

    let RecalculationPlan { batch, result } =
        plan_recalculation(project, new_end_date, &candidates, clients);

    if batch.is_empty() {
        info!(project = %project.id, skipped = result.skipped_count, "nothing to update");
        return result;
    }

    match store.commit(owner_id, batch) {
        Ok(()) => {
            info!(
                project = %project.id,
                updated = result.updated_count,
                skipped = result.skipped_count,
                "settlement dates recalculated"
            );
            result
        }
        Err(err) => {
            warn!(project = %project.id, error = %err, "settlement update was not committed");
            result.failed(format!(
                "Settlement dates were not updated because saving failed: {err}"
            ))
        }
    }
}
