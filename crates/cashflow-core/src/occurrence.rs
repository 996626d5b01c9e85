//! Expands a recurrence rule into a bounded, ascending stream of dates.

use chrono::{Datelike, NaiveDate};
use tracing::{debug, warn};

use cashflow_domain::{
    add_months, add_years, first_day_of_month, set_day_with_month_end_fallback, with_month_start,
    Frequency, RecurrenceRule,
};

/// Window used for open-ended rules when the caller supplies none.
pub const DEFAULT_MAX_MONTHS: u32 = 12;
/// Hard ceiling on dates produced by a single expansion.
pub const MAX_OCCURRENCES_PER_CALL: usize = 4096;
const MAX_ALIGNMENT_SHIFTS: usize = 4;

/// Returns the occurrence one period after `current`. The day of period is
/// re-applied from the rule each time, so a 31st rule returns to the 31st after
/// passing through a short month.
pub fn calculate_next_occurrence(current: NaiveDate, rule: &RecurrenceRule) -> NaiveDate {
    let month_start = first_day_of_month(current);
    match rule.frequency {
        Frequency::Monthly => {
            set_day_with_month_end_fallback(add_months(month_start, 1), rule.day_of_period)
        }
        Frequency::Yearly => {
            let month = rule.month_of_year.unwrap_or(current.month());
            let next_year = with_month_start(add_years(month_start, 1), month);
            set_day_with_month_end_fallback(next_year, rule.day_of_period)
        }
    }
}

/// Places `date` on the rule's month (yearly) and day of period.
fn align_to_rule(date: NaiveDate, rule: &RecurrenceRule) -> NaiveDate {
    match rule.frequency {
        Frequency::Monthly => set_day_with_month_end_fallback(date, rule.day_of_period),
        Frequency::Yearly => {
            let month = rule.month_of_year.unwrap_or(date.month());
            set_day_with_month_end_fallback(with_month_start(date, month), rule.day_of_period)
        }
    }
}

/// Lazy iterator over the occurrences of a rule inside a closed window.
#[derive(Debug, Clone)]
pub struct Occurrences {
    rule: RecurrenceRule,
    next: Option<NaiveDate>,
    window_end: NaiveDate,
    emitted: usize,
}

impl Occurrences {
    /// Occurrences from `start` up to `end`, or up to `start + max_months` when
    /// the rule has no end.
    pub fn new(
        start: NaiveDate,
        end: Option<NaiveDate>,
        rule: RecurrenceRule,
        max_months: u32,
    ) -> Self {
        let window_end = end.unwrap_or_else(|| add_months(start, max_months));
        let mut candidate = align_to_rule(start, &rule);
        let mut shifts = 0;
        while candidate < start && shifts < MAX_ALIGNMENT_SHIFTS {
            candidate = calculate_next_occurrence(candidate, &rule);
            shifts += 1;
        }
        let next = (candidate >= start).then_some(candidate);
        Self {
            rule,
            next,
            window_end,
            emitted: 0,
        }
    }

    pub fn window_end(&self) -> NaiveDate {
        self.window_end
    }
}

impl Iterator for Occurrences {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        if current > self.window_end {
            self.next = None;
            return None;
        }
        if self.emitted >= MAX_OCCURRENCES_PER_CALL {
            warn!(
                window_end = %self.window_end,
                "occurrence expansion stopped at {MAX_OCCURRENCES_PER_CALL} dates"
            );
            self.next = None;
            return None;
        }
        self.emitted += 1;
        self.next = Some(calculate_next_occurrence(current, &self.rule));
        Some(current)
    }
}

/// Collects the occurrence dates of a rule, ascending and without duplicates.
pub fn generate_occurrence_dates(
    start: NaiveDate,
    end: Option<NaiveDate>,
    rule: &RecurrenceRule,
    max_months: u32,
) -> Vec<NaiveDate> {
    let occurrences = Occurrences::new(start, end, *rule, max_months);
    let window_end = occurrences.window_end();
    let dates: Vec<NaiveDate> = occurrences.collect();
    debug!(
        %start,
        %window_end,
        frequency = %rule.frequency,
        count = dates.len(),
        "generated occurrence dates"
    );
    dates
}
