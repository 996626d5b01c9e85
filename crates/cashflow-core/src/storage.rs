//! Collaborator contracts for the persistence layer and the staged update batch
//! handed to it.

use std::collections::HashSet;

use chrono::NaiveDate;
use uuid::Uuid;

use cashflow_domain::{Client, Project, RecurringMaster, Transaction};

use crate::CoreError;

/// A single field-level change to a stored transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldChange {
    TransactionDate(NaiveDate),
    SettlementDate(NaiveDate),
}

impl FieldChange {
    pub fn apply(&self, transaction: &mut Transaction) {
        match *self {
            FieldChange::TransactionDate(date) => transaction.transaction_date = date,
            FieldChange::SettlementDate(date) => transaction.settlement_date = Some(date),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedUpdate {
    pub transaction_id: Uuid,
    pub changes: Vec<FieldChange>,
}

/// Updates accumulated by the engine and committed as one unit by a [`TransactionStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateBatch {
    updates: Vec<StagedUpdate>,
}

impl UpdateBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&mut self, transaction_id: Uuid, changes: Vec<FieldChange>) {
        self.updates.push(StagedUpdate {
            transaction_id,
            changes,
        });
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn updates(&self) -> &[StagedUpdate] {
        &self.updates
    }

    pub fn touches(&self, transaction_id: Uuid) -> bool {
        self.updates
            .iter()
            .any(|update| update.transaction_id == transaction_id)
    }

    /// Applies every staged update to `transactions`, or none of them: all ids
    /// are resolved before the first change is written.
    pub fn apply_to(&self, transactions: &mut [Transaction]) -> Result<(), CoreError> {
        let known: HashSet<Uuid> = transactions.iter().filter_map(|txn| txn.id).collect();
        if let Some(missing) = self
            .updates
            .iter()
            .find(|update| !known.contains(&update.transaction_id))
        {
            return Err(CoreError::TransactionNotFound(missing.transaction_id));
        }
        for update in &self.updates {
            for txn in transactions
                .iter_mut()
                .filter(|txn| txn.id == Some(update.transaction_id))
            {
                for change in &update.changes {
                    change.apply(txn);
                }
            }
        }
        Ok(())
    }
}

/// Transaction persistence consumed by the engine.
pub trait TransactionStore: Send + Sync {
    /// Income transactions of `owner_id` linked to `project_id`.
    fn income_by_project(
        &self,
        owner_id: &str,
        project_id: Uuid,
    ) -> Result<Vec<Transaction>, CoreError>;
    /// Every stored instance generated from `master_id`.
    fn instances_of(&self, owner_id: &str, master_id: Uuid) -> Result<Vec<Transaction>, CoreError>;
    fn transactions(&self, owner_id: &str) -> Result<Vec<Transaction>, CoreError>;
    /// Stores drafts, assigning identities. Returns the new ids in input order.
    fn insert(&self, owner_id: &str, drafts: Vec<Transaction>) -> Result<Vec<Uuid>, CoreError>;
    /// Commits the batch atomically; on error nothing has been applied.
    fn commit(&self, owner_id: &str, batch: UpdateBatch) -> Result<(), CoreError>;
}

/// Reference data the surrounding application keeps next to transactions.
pub trait ReferenceStore: Send + Sync {
    fn clients(&self, owner_id: &str) -> Result<Vec<Client>, CoreError>;
    fn projects(&self, owner_id: &str) -> Result<Vec<Project>, CoreError>;
    fn recurring_masters(&self, owner_id: &str) -> Result<Vec<RecurringMaster>, CoreError>;
    fn save_client(&self, owner_id: &str, client: &Client) -> Result<(), CoreError>;
    fn save_project(&self, owner_id: &str, project: &Project) -> Result<(), CoreError>;
    fn save_recurring_master(
        &self,
        owner_id: &str,
        master: &RecurringMaster,
    ) -> Result<(), CoreError>;
}
