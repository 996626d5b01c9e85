//! Domain models for dated cash movements and their link to recurring masters.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        };
        f.write_str(label)
    }
}

/// Ties a generated instance to its master. The instance date is the originally
/// scheduled date and survives later edits of `transaction_date`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurrenceLink {
    #[serde(rename = "recurringMasterId")]
    pub master_id: Uuid,
    #[serde(rename = "recurringInstanceDate")]
    pub instance_date: NaiveDate,
}

/// How automation may treat a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    Editable,
    /// Reconciled; never touched by automation.
    Settled,
    /// Diverged from its rule by hand; exempt from recalculation.
    Detached,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// `None` for drafts that the persistence layer has not stored yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub owner_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    pub transaction_date: NaiveDate,
    #[serde(default)]
    pub settlement_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_settled: bool,
    #[serde(default)]
    pub is_detached: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Uuid>,
    #[serde(flatten)]
    pub recurrence: Option<RecurrenceLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_estimate: bool,
}

impl Transaction {
    /// Creates an unsaved, editable transaction whose settlement falls on its own date.
    pub fn draft(
        owner_id: impl Into<String>,
        kind: TransactionKind,
        amount: Decimal,
        title: impl Into<String>,
        transaction_date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            owner_id: owner_id.into(),
            kind,
            amount,
            title: title.into(),
            memo: None,
            transaction_date,
            settlement_date: Some(transaction_date),
            is_settled: false,
            is_detached: false,
            client_id: None,
            recurrence: None,
            project_id: None,
            is_estimate: false,
        }
    }

    pub fn recurring_master_id(&self) -> Option<Uuid> {
        self.recurrence.map(|link| link.master_id)
    }

    pub fn recurring_instance_date(&self) -> Option<NaiveDate> {
        self.recurrence.map(|link| link.instance_date)
    }

    pub fn is_instance_of(&self, master_id: Uuid) -> bool {
        self.recurring_master_id() == Some(master_id)
    }

    /// Date the money actually moves; the accrual date when no settlement is known.
    pub fn cash_date(&self) -> NaiveDate {
        self.settlement_date.unwrap_or(self.transaction_date)
    }

    /// Settlement lock wins over detachment.
    pub fn mutability(&self) -> Mutability {
        if self.is_settled {
            Mutability::Settled
        } else if self.is_detached {
            Mutability::Detached
        } else {
            Mutability::Editable
        }
    }

    pub fn mark_settled(&mut self) {
        self.is_settled = true;
    }

    /// Records a manual edit: generated instances stop following their rule.
    pub fn detach(&mut self) {
        if self.recurrence.is_some() {
            self.is_detached = true;
        }
    }

    /// Signed contribution to a cash balance.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }
}

impl Displayable for Transaction {
    fn display_label(&self) -> String {
        match self.id {
            Some(id) => format!("\"{}\" ({}, {})", self.title, self.transaction_date, id),
            None => format!("\"{}\" ({}, draft)", self.title, self.transaction_date),
        }
    }
}
