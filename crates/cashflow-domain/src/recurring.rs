//! Recurring masters: templates that expand into dated transaction instances.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{common::*, transaction::TransactionKind, DomainError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Monthly,
    Yearly,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Frequency::Monthly => "Monthly",
            Frequency::Yearly => "Yearly",
        };
        f.write_str(label)
    }
}

/// The calendar part of a master: how often, and on which day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    /// `1..=31`; 31 or any day past the month's length means the last day.
    pub day_of_period: u32,
    /// Yearly rules only.
    pub month_of_year: Option<u32>,
}

impl RecurrenceRule {
    pub fn monthly(day_of_period: u32) -> Self {
        Self {
            frequency: Frequency::Monthly,
            day_of_period,
            month_of_year: None,
        }
    }

    pub fn yearly(month_of_year: u32, day_of_period: u32) -> Self {
        Self {
            frequency: Frequency::Yearly,
            day_of_period,
            month_of_year: Some(month_of_year),
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !(1..=31).contains(&self.day_of_period) {
            return Err(DomainError::InvalidDayOfPeriod(self.day_of_period));
        }
        if let Some(month) = self.month_of_year {
            if !(1..=12).contains(&month) {
                return Err(DomainError::InvalidMonthOfYear(month));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecurringMaster {
    pub id: Uuid,
    pub owner_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Uuid>,
    pub frequency: Frequency,
    pub day_of_period: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month_of_year: Option<u32>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default = "RecurringMaster::default_active")]
    pub is_active: bool,
}

impl RecurringMaster {
    pub fn new(
        owner_id: impl Into<String>,
        title: impl Into<String>,
        kind: TransactionKind,
        amount: Decimal,
        rule: RecurrenceRule,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            title: title.into(),
            memo: None,
            kind,
            amount,
            client_id: None,
            frequency: rule.frequency,
            day_of_period: rule.day_of_period,
            month_of_year: rule.month_of_year,
            start_date: Some(start_date),
            end_date: None,
            is_active: true,
        }
    }

    pub fn with_client(mut self, client_id: Uuid) -> Self {
        self.client_id = Some(client_id);
        self
    }

    pub fn ending_on(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn rule(&self) -> RecurrenceRule {
        RecurrenceRule {
            frequency: self.frequency,
            day_of_period: self.day_of_period,
            month_of_year: self.month_of_year,
        }
    }

    pub fn is_open_ended(&self) -> bool {
        self.end_date.is_none()
    }

    /// Freezes auto-extension; existing instances stay untouched.
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Memo copied onto generated instances.
    pub fn instance_memo(&self) -> String {
        self.memo
            .as_ref()
            .filter(|memo| !memo.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| self.title.clone())
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        self.rule().validate()?;
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(DomainError::EndBeforeStart { start, end });
            }
        }
        Ok(())
    }

    pub fn default_active() -> bool {
        true
    }
}

impl Identifiable for RecurringMaster {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for RecurringMaster {
    fn display_label(&self) -> String {
        format!("{} \"{}\"", self.frequency, self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn master() -> RecurringMaster {
        RecurringMaster::new(
            "owner",
            "Rent",
            TransactionKind::Expense,
            Decimal::new(1500, 0),
            RecurrenceRule::monthly(1),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
    }

    #[test]
    fn validate_rejects_bad_rule_values() {
        let mut bad_day = master();
        bad_day.day_of_period = 0;
        assert_eq!(bad_day.validate(), Err(DomainError::InvalidDayOfPeriod(0)));

        let mut bad_month = master();
        bad_month.frequency = Frequency::Yearly;
        bad_month.month_of_year = Some(13);
        assert_eq!(bad_month.validate(), Err(DomainError::InvalidMonthOfYear(13)));

        let reversed = master().ending_on(NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
        assert!(matches!(
            reversed.validate(),
            Err(DomainError::EndBeforeStart { .. })
        ));
    }

    #[test]
    fn memo_falls_back_to_title() {
        let mut rent = master();
        assert_eq!(rent.instance_memo(), "Rent");
        rent.memo = Some("Flat 4B".into());
        assert_eq!(rent.instance_memo(), "Flat 4B");
    }

    #[test]
    fn missing_active_flag_defaults_to_active() {
        let mut json = serde_json::to_value(master()).expect("serialize");
        json.as_object_mut().unwrap().remove("isActive");
        let back: RecurringMaster = serde_json::from_value(json).expect("deserialize");
        assert!(back.is_active);
    }
}
