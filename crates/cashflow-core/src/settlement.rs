//! Turns an accrual date plus a client's payment terms into a settlement date.

use chrono::NaiveDate;

use cashflow_domain::{
    add_months, first_day_of_month, Client, DomainError, PaymentTerms, SettlementDay, StartOfDay,
};

/// Computes when money for a transaction dated `transaction_date` moves.
///
/// A transaction dated on the closing day belongs to the current cycle; one
/// dated after it rolls into the next month's cycle. The payment month is the
/// closing month plus `payment_month_offset`, and the payment day is clamped to
/// that month's length.
pub fn calculate_settlement_date(transaction_date: impl StartOfDay, terms: PaymentTerms) -> NaiveDate {
    let date = transaction_date.start_of_day();
    let mut closing = terms.closing_day.resolve_in(date);
    if date > closing {
        closing = terms
            .closing_day
            .resolve_in(add_months(first_day_of_month(closing), 1));
    }
    let payment_month = add_months(first_day_of_month(closing), terms.payment_month_offset);
    terms.payment_day.resolve_in(payment_month)
}

/// Validating entry point for raw term values (`99` = month-end).
pub fn calculate_settlement_date_raw(
    transaction_date: impl StartOfDay,
    closing_day: u32,
    payment_month_offset: i64,
    payment_day: u32,
) -> Result<NaiveDate, DomainError> {
    let terms = PaymentTerms::from_raw(closing_day, payment_month_offset, payment_day)?;
    Ok(calculate_settlement_date(transaction_date, terms))
}

pub fn settlement_for_client(transaction_date: impl StartOfDay, client: &Client) -> NaiveDate {
    calculate_settlement_date(transaction_date, client.terms())
}

/// Human-readable description of a payment cycle, e.g.
/// "Closes on the 25th, paid on the 10th of the following month".
pub fn format_payment_cycle(terms: PaymentTerms) -> String {
    let closing = match terms.closing_day {
        SettlementDay::MonthEnd => "Closes at month-end".to_string(),
        day => format!("Closes on the {day}"),
    };
    let payment = match terms.payment_day {
        SettlementDay::MonthEnd => "paid at month-end".to_string(),
        day => format!("paid on the {day}"),
    };
    let month = match terms.payment_month_offset {
        0 => "of the same month".to_string(),
        1 => "of the following month".to_string(),
        n => format!("{n} months after closing"),
    };
    if terms.payment_month_offset > 1 {
        format!("{closing}, {payment}, {month}")
    } else {
        format!("{closing}, {payment} {month}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn terms(closing: u32, offset: i64, payment: u32) -> PaymentTerms {
        PaymentTerms::from_raw(closing, offset, payment).unwrap()
    }

    #[test]
    fn before_closing_settles_next_month() {
        assert_eq!(
            calculate_settlement_date(ymd(2024, 1, 20), terms(25, 1, 10)),
            ymd(2024, 2, 10)
        );
    }

    #[test]
    fn after_closing_rolls_to_next_cycle() {
        assert_eq!(
            calculate_settlement_date(ymd(2024, 1, 26), terms(25, 1, 10)),
            ymd(2024, 3, 10)
        );
    }

    #[test]
    fn closing_day_itself_is_current_cycle() {
        assert_eq!(
            calculate_settlement_date(ymd(2024, 1, 25), terms(25, 1, 10)),
            ymd(2024, 2, 10)
        );
    }

    #[test]
    fn month_end_terms_follow_month_lengths() {
        let month_end = terms(99, 1, 99);
        assert_eq!(calculate_settlement_date(ymd(2024, 1, 31), month_end), ymd(2024, 2, 29));
        assert_eq!(calculate_settlement_date(ymd(2023, 1, 15), month_end), ymd(2023, 2, 28));
        assert_eq!(calculate_settlement_date(ymd(2024, 4, 30), month_end), ymd(2024, 5, 31));
    }

    #[test]
    fn zero_offset_pays_in_closing_month() {
        assert_eq!(
            calculate_settlement_date(ymd(2024, 3, 3), terms(20, 0, 28)),
            ymd(2024, 3, 28)
        );
    }

    #[test]
    fn time_component_is_ignored() {
        let late = ymd(2024, 1, 25).and_hms_opt(23, 30, 0).unwrap();
        assert_eq!(calculate_settlement_date(late, terms(25, 1, 10)), ymd(2024, 2, 10));
    }

    #[test]
    fn raw_entry_point_rejects_invalid_terms() {
        assert!(calculate_settlement_date_raw(ymd(2024, 1, 1), 0, 1, 10).is_err());
        assert!(calculate_settlement_date_raw(ymd(2024, 1, 1), 25, -2, 10).is_err());
        assert!(calculate_settlement_date_raw(ymd(2024, 1, 1), 25, 1, 30).is_err());
        assert_eq!(
            calculate_settlement_date_raw(ymd(2024, 1, 20), 25, 1, 10),
            Ok(ymd(2024, 2, 10))
        );
    }

    #[test]
    fn payment_cycle_labels() {
        assert_eq!(
            format_payment_cycle(terms(25, 1, 10)),
            "Closes on the 25th, paid on the 10th of the following month"
        );
        assert_eq!(
            format_payment_cycle(terms(99, 0, 99)),
            "Closes at month-end, paid at month-end of the same month"
        );
        assert_eq!(
            format_payment_cycle(terms(20, 2, 5)),
            "Closes on the 20th, paid on the 5th, 2 months after closing"
        );
    }
}
