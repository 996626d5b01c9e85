//! Cash-position projection over a calendar window, including synthetic
//! estimates for months beyond the generated horizon.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use cashflow_domain::{Client, DateWindow, RecurringMaster, Transaction, TransactionKind};

use crate::{
    materializer::materialize_occurrences, occurrence::generate_occurrence_dates,
    DEFAULT_MAX_MONTHS,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyPosition {
    pub date: NaiveDate,
    pub inflow: Decimal,
    pub outflow: Decimal,
    pub net: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionTotals {
    pub inflow: Decimal,
    pub outflow: Decimal,
    pub net: Decimal,
    pub closing_balance: Decimal,
    pub estimated_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CashFlowProjection {
    pub window: DateWindow,
    pub opening_balance: Decimal,
    /// Only days with movement, ascending.
    pub days: Vec<DailyPosition>,
    pub totals: ProjectionTotals,
}

impl CashFlowProjection {
    /// Balance at the end of `date`, carrying forward across quiet days.
    pub fn balance_on(&self, date: NaiveDate) -> Decimal {
        self.days
            .iter()
            .take_while(|day| day.date <= date)
            .last()
            .map(|day| day.balance)
            .unwrap_or(self.opening_balance)
    }
}

/// Buckets transactions by cash date within `window` and runs the balance forward.
pub fn project_cash_position(
    opening_balance: Decimal,
    transactions: &[Transaction],
    window: DateWindow,
) -> CashFlowProjection {
    let mut buckets: BTreeMap<NaiveDate, (Decimal, Decimal, Decimal)> = BTreeMap::new();
    let mut totals = ProjectionTotals::default();

    for txn in transactions {
        let date = txn.cash_date();
        if !window.contains(date) {
            continue;
        }
        let entry = buckets.entry(date).or_default();
        match txn.kind {
            TransactionKind::Income => entry.0 += txn.amount,
            TransactionKind::Expense => entry.1 += txn.amount,
        }
        entry.2 += txn.signed_amount();
        if txn.is_estimate {
            totals.estimated_count += 1;
        }
    }

    let mut balance = opening_balance;
    let days = buckets
        .into_iter()
        .map(|(date, (inflow, outflow, net))| {
            balance += net;
            totals.inflow += inflow;
            totals.outflow += outflow;
            DailyPosition {
                date,
                inflow,
                outflow,
                net,
                balance,
            }
        })
        .collect();
    totals.net = balance - opening_balance;
    totals.closing_balance = balance;

    CashFlowProjection {
        window,
        opening_balance,
        days,
        totals,
    }
}

/// Synthetic, never-persisted instances of an active master scheduled after
/// `horizon_end` (the latest stored instance) whose cash date falls inside
/// `window`. An occurrence before the window still counts when it is paid
/// inside it.
pub fn estimate_transactions(
    master: &RecurringMaster,
    clients: &[Client],
    owner_id: &str,
    window: DateWindow,
    horizon_end: Option<NaiveDate>,
) -> Vec<Transaction> {
    let Some(start) = master.start_date else {
        return Vec::new();
    };
    if !master.is_active {
        return Vec::new();
    }
    let bound = match master.end_date {
        Some(end) => end.min(window.end),
        None => window.end,
    };
    let dates: Vec<NaiveDate> =
        generate_occurrence_dates(start, Some(bound), &master.rule(), DEFAULT_MAX_MONTHS)
            .into_iter()
            .filter(|date| horizon_end.map_or(true, |horizon| *date > horizon))
            .collect();

    materialize_occurrences(master, &dates, clients, owner_id)
        .into_iter()
        .filter(|estimate| window.contains(estimate.cash_date()))
        .map(|mut estimate| {
            estimate.is_estimate = true;
            estimate
        })
        .collect()
}
