//! Clients and the payment terms that turn an accrual date into a settlement date.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{calendar::days_in_month, common::*, DomainError};

/// Raw value persisted for "last day of the month".
pub const MONTH_END_SENTINEL: u32 = 99;
/// Highest concrete day accepted for closing and payment days.
pub const MAX_CONCRETE_DAY: u32 = 28;

/// A concrete day of month in `1..=28`, valid in every month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CalendarDay(u32);

impl CalendarDay {
    pub fn new(day: u32) -> Result<Self, DomainError> {
        if (1..=MAX_CONCRETE_DAY).contains(&day) {
            Ok(Self(day))
        } else {
            Err(DomainError::InvalidSettlementDay(day))
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

/// Closing or payment day of a client relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum SettlementDay {
    Day(CalendarDay),
    MonthEnd,
}

impl SettlementDay {
    /// Parses the persisted representation (`1..=28`, or `99` for month-end).
    pub fn from_raw(value: u32) -> Result<Self, DomainError> {
        if value == MONTH_END_SENTINEL {
            return Ok(SettlementDay::MonthEnd);
        }
        CalendarDay::new(value).map(SettlementDay::Day)
    }

    pub fn raw(self) -> u32 {
        match self {
            SettlementDay::Day(day) => day.get(),
            SettlementDay::MonthEnd => MONTH_END_SENTINEL,
        }
    }

    pub fn is_month_end(self) -> bool {
        matches!(self, SettlementDay::MonthEnd)
    }

    /// Resolves this day inside the month containing `date`, clamped to the
    /// month's real length.
    pub fn resolve_in(self, date: NaiveDate) -> NaiveDate {
        let last = days_in_month(date.year(), date.month());
        let day = match self {
            SettlementDay::Day(day) => day.get().min(last),
            SettlementDay::MonthEnd => last,
        };
        date.with_day(day).unwrap_or(date)
    }
}

impl TryFrom<u32> for SettlementDay {
    type Error = DomainError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        SettlementDay::from_raw(value)
    }
}

impl From<SettlementDay> for u32 {
    fn from(value: SettlementDay) -> Self {
        value.raw()
    }
}

impl fmt::Display for SettlementDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementDay::MonthEnd => f.write_str("month-end"),
            SettlementDay::Day(day) => {
                let n = day.get();
                let suffix = match (n % 10, n % 100) {
                    (1, 11) | (2, 12) | (3, 13) => "th",
                    (1, _) => "st",
                    (2, _) => "nd",
                    (3, _) => "rd",
                    _ => "th",
                };
                write!(f, "{n}{suffix}")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Closing day, months until payment, and payment day for a client.
pub struct PaymentTerms {
    pub closing_day: SettlementDay,
    pub payment_month_offset: u32,
    pub payment_day: SettlementDay,
}

impl PaymentTerms {
    pub fn new(closing_day: SettlementDay, payment_month_offset: u32, payment_day: SettlementDay) -> Self {
        Self {
            closing_day,
            payment_month_offset,
            payment_day,
        }
    }

    /// Validates raw terms as they arrive from forms or storage.
    pub fn from_raw(
        closing_day: u32,
        payment_month_offset: i64,
        payment_day: u32,
    ) -> Result<Self, DomainError> {
        let closing_day = SettlementDay::from_raw(closing_day)?;
        let payment_day = SettlementDay::from_raw(payment_day)?;
        let offset = u32::try_from(payment_month_offset)
            .map_err(|_| DomainError::NegativeMonthOffset(payment_month_offset))?;
        Ok(Self::new(closing_day, offset, payment_day))
    }

    /// Terms used by the common "month-end close, paid end of next month" arrangement.
    pub fn month_end_next_month() -> Self {
        Self::new(SettlementDay::MonthEnd, 1, SettlementDay::MonthEnd)
    }
}

impl Default for PaymentTerms {
    fn default() -> Self {
        Self::month_end_next_month()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub closing_day: SettlementDay,
    pub payment_month_offset: u32,
    pub payment_day: SettlementDay,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
}

impl Client {
    pub fn new(owner_id: impl Into<String>, name: impl Into<String>, terms: PaymentTerms) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            name: name.into(),
            closing_day: terms.closing_day,
            payment_month_offset: terms.payment_month_offset,
            payment_day: terms.payment_day,
            sort_order: None,
        }
    }

    pub fn terms(&self) -> PaymentTerms {
        PaymentTerms::new(self.closing_day, self.payment_month_offset, self.payment_day)
    }
}

impl Identifiable for Client {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for Client {
    fn display_label(&self) -> String {
        format!("client \"{}\"", self.name)
    }
}

/// Orders clients by explicit sort order first, then by name.
pub fn sort_clients(clients: &mut [Client]) {
    clients.sort_by(|a, b| {
        let left = a.sort_order.unwrap_or(i32::MAX);
        let right = b.sort_order.unwrap_or(i32::MAX);
        left.cmp(&right).then_with(|| a.name.cmp(&b.name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settlement_day_rejects_out_of_range_values() {
        assert_eq!(SettlementDay::from_raw(0), Err(DomainError::InvalidSettlementDay(0)));
        assert_eq!(SettlementDay::from_raw(29), Err(DomainError::InvalidSettlementDay(29)));
        assert_eq!(SettlementDay::from_raw(99), Ok(SettlementDay::MonthEnd));
        assert_eq!(SettlementDay::from_raw(28).map(SettlementDay::raw), Ok(28));
    }

    #[test]
    fn negative_offsets_fail_fast() {
        assert_eq!(
            PaymentTerms::from_raw(25, -1, 10),
            Err(DomainError::NegativeMonthOffset(-1))
        );
    }

    #[test]
    fn client_serializes_month_end_as_sentinel() {
        let client = Client::new("owner", "Acme", PaymentTerms::month_end_next_month());
        let json = serde_json::to_value(&client).expect("serialize client");
        assert_eq!(json["closingDay"], 99);
        assert_eq!(json["paymentMonthOffset"], 1);

        let mut raw = json.clone();
        raw["paymentDay"] = serde_json::json!(31);
        assert!(serde_json::from_value::<Client>(raw).is_err());
    }

    #[test]
    fn ordinal_labels() {
        let labels: Vec<String> = [1, 2, 3, 11, 22, 25]
            .into_iter()
            .map(|d| SettlementDay::from_raw(d).unwrap().to_string())
            .collect();
        assert_eq!(labels, ["1st", "2nd", "3rd", "11th", "22nd", "25th"]);
    }

    #[test]
    fn clients_sort_by_order_then_name() {
        let mut clients = vec![
            Client::new("o", "Zeta", PaymentTerms::default()),
            Client::new("o", "Alpha", PaymentTerms::default()),
            Client::new("o", "Mid", PaymentTerms::default()),
        ];
        clients[0].sort_order = Some(1);
        sort_clients(&mut clients);
        let names: Vec<&str> = clients.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Zeta", "Alpha", "Mid"]);
    }
}
