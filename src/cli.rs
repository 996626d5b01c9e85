//! Non-interactive command front end for `cashflow_cli`.

use std::{env, fmt::Write as _, fs, path::PathBuf, str::FromStr};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use cashflow_config::{Config, ConfigManager};
use cashflow_core::{
    calculate_settlement_date_raw, format_payment_cycle, generate_occurrence_dates,
    CashFlowProjection, RecalculationResult, DEFAULT_MAX_MONTHS,
};
use cashflow_domain::{DateWindow, Frequency, PaymentTerms, RecurrenceRule};
use cashflow_storage_json::JsonPlannerStore;

use crate::{utils::build_info, CashFlowPlanner, PlannerError, Result};

/// Overrides the configuration base directory. Owner documents default to
/// `<home>/data` when the configuration does not name a data root.
pub const HOME_ENV: &str = "CASHFLOW_HOME";

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default)]
pub struct CliContext {
    home: Option<PathBuf>,
}

impl CliContext {
    pub fn from_env() -> Self {
        Self {
            home: env::var_os(HOME_ENV).map(PathBuf::from),
        }
    }

    pub fn with_home(home: PathBuf) -> Self {
        Self { home: Some(home) }
    }

    /// Runs one command and returns what it prints on success.
    pub fn run(&self, args: &[String]) -> Result<String> {
        let mut args = ArgCursor::new(args);
        let command = args.next().ok_or_else(|| PlannerError::Usage(usage()))?;

        match command {
            "settle" => settle(&mut args),
            "cycle" => cycle(&mut args),
            "occurrences" => occurrences(&mut args),
            "extend" => self.extend(&mut args),
            "recalc" => self.recalc(&mut args),
            "project" => self.project(&mut args),
            "script" => self.script(&mut args),
            "version" => Ok(build_info::current().report()),
            "help" | "--help" | "-h" => Ok(usage()),
            other => Err(PlannerError::Usage(format!(
                "unknown command '{other}'\n{}",
                usage()
            ))),
        }
    }

    fn load_config(&self) -> Result<Config> {
        match &self.home {
            Some(home) => {
                let mut config = ConfigManager::with_base_dir(home.clone())?.load()?;
                if config.data_root.is_none() {
                    config.data_root = Some(home.join("data"));
                }
                Ok(config)
            }
            None => Ok(ConfigManager::from_default_location()?.load()?),
        }
    }

    fn planner(&self) -> Result<(CashFlowPlanner<JsonPlannerStore>, Config)> {
        let config = self.load_config()?;
        let planner = CashFlowPlanner::from_config(&config)?;
        Ok((planner, config))
    }

    fn extend(&self, args: &mut ArgCursor<'_>) -> Result<String> {
        let (planner, config) = self.planner()?;
        let owner = match args.next() {
            Some(owner) => owner.to_string(),
            None => config
                .default_owner
                .clone()
                .ok_or_else(|| PlannerError::Usage("extend <owner>".into()))?,
        };
        args.finish("extend")?;

        let report = planner.extend_recurring(&owner)?;
        Ok(format!(
            "Checked {} recurring masters for {owner}: {} extended, {} transactions created",
            report.masters_checked, report.masters_extended, report.transactions_created
        ))
    }

    fn recalc(&self, args: &mut ArgCursor<'_>) -> Result<String> {
        const USAGE: &str = "recalc <owner> <project-id> <YYYY-MM-DD>";
        let owner = args.required(USAGE)?;
        let project_id = parse_uuid(args.required(USAGE)?)?;
        let new_end_date = parse_date(args.required(USAGE)?)?;
        args.finish(USAGE)?;

        let (planner, _) = self.planner()?;
        let result = planner.update_project_end_date(owner, project_id, new_end_date)?;
        let report = render_recalculation(project_id, new_end_date, &result);
        if result.success {
            Ok(report)
        } else {
            Err(PlannerError::Recalculation(report))
        }
    }

    fn project(&self, args: &mut ArgCursor<'_>) -> Result<String> {
        const USAGE: &str = "project <owner> <opening-balance> <from> <to>";
        let owner = args.required(USAGE)?;
        let opening = parse_decimal(args.required(USAGE)?)?;
        let from = parse_date(args.required(USAGE)?)?;
        let to = parse_date(args.required(USAGE)?)?;
        args.finish(USAGE)?;

        let window = DateWindow::new(from, to)?;
        let (planner, _) = self.planner()?;
        let projection = planner.projection(owner, opening, window)?;
        Ok(render_projection(&projection))
    }

    fn script(&self, args: &mut ArgCursor<'_>) -> Result<String> {
        const USAGE: &str = "script <file>";
        let path = PathBuf::from(args.required(USAGE)?);
        args.finish(USAGE)?;

        let contents = fs::read_to_string(&path)?;
        let mut outputs = Vec::new();
        for (index, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let words = shell_words::split(line).map_err(|err| {
                PlannerError::InvalidInput(format!("line {}: {err}", index + 1))
            })?;
            if words.first().map(String::as_str) == Some("script") {
                return Err(PlannerError::Usage(format!(
                    "line {}: scripts cannot run other scripts",
                    index + 1
                )));
            }
            outputs.push(self.run(&words)?);
        }
        Ok(outputs.join("\n"))
    }
}

fn settle(args: &mut ArgCursor<'_>) -> Result<String> {
    const USAGE: &str = "settle <YYYY-MM-DD> <closing-day> <month-offset> <payment-day>";
    let date = parse_date(args.required(USAGE)?)?;
    let closing = parse_number::<u32>(args.required(USAGE)?, "closing day")?;
    let offset = parse_number::<i64>(args.required(USAGE)?, "month offset")?;
    let payment = parse_number::<u32>(args.required(USAGE)?, "payment day")?;
    args.finish(USAGE)?;

    let settlement = calculate_settlement_date_raw(date, closing, offset, payment)?;
    Ok(settlement.format(DATE_FORMAT).to_string())
}

fn cycle(args: &mut ArgCursor<'_>) -> Result<String> {
    const USAGE: &str = "cycle <closing-day> <month-offset> <payment-day>";
    let closing = parse_number::<u32>(args.required(USAGE)?, "closing day")?;
    let offset = parse_number::<i64>(args.required(USAGE)?, "month offset")?;
    let payment = parse_number::<u32>(args.required(USAGE)?, "payment day")?;
    args.finish(USAGE)?;

    let terms = PaymentTerms::from_raw(closing, offset, payment)?;
    Ok(format_payment_cycle(terms))
}

fn occurrences(args: &mut ArgCursor<'_>) -> Result<String> {
    const USAGE: &str =
        "occurrences <start> <monthly|yearly> <day> [month] [--end <date>] [--months N]";
    let start = parse_date(args.required(USAGE)?)?;
    let frequency = match args.required(USAGE)? {
        "monthly" => Frequency::Monthly,
        "yearly" => Frequency::Yearly,
        other => {
            return Err(PlannerError::InvalidInput(format!(
                "unknown frequency '{other}' (expected monthly or yearly)"
            )))
        }
    };
    let day = parse_number::<u32>(args.required(USAGE)?, "day")?;

    let mut month_of_year = None;
    let mut end = None;
    let mut max_months = DEFAULT_MAX_MONTHS;
    while let Some(arg) = args.next() {
        match arg {
            "--end" => end = Some(parse_date(args.required(USAGE)?)?),
            "--months" => max_months = parse_number::<u32>(args.required(USAGE)?, "months")?,
            month if frequency == Frequency::Yearly && month_of_year.is_none() => {
                month_of_year = Some(parse_number::<u32>(month, "month")?);
            }
            other => {
                return Err(PlannerError::Usage(format!(
                    "unexpected argument '{other}'\nusage: {USAGE}"
                )))
            }
        }
    }

    let rule = RecurrenceRule {
        frequency,
        day_of_period: day,
        month_of_year,
    };
    rule.validate()?;
    if let Some(end) = end {
        DateWindow::new(start, end)?;
    }

    let dates = generate_occurrence_dates(start, end, &rule, max_months);
    Ok(dates
        .iter()
        .map(|date| date.format(DATE_FORMAT).to_string())
        .collect::<Vec<_>>()
        .join("\n"))
}

fn render_recalculation(
    project_id: Uuid,
    new_end_date: NaiveDate,
    result: &RecalculationResult,
) -> String {
    let mut out = format!(
        "Project {project_id} end date {}: {}",
        new_end_date.format(DATE_FORMAT),
        result.summary()
    );
    for warning in &result.warnings {
        let _ = write!(out, "\n  warning: {warning}");
    }
    out
}

fn render_projection(projection: &CashFlowProjection) -> String {
    let mut out = format!(
        "Cash position {} (opening {})",
        projection.window, projection.opening_balance
    );
    for day in &projection.days {
        let _ = write!(
            out,
            "\n{}  in {:>12}  out {:>12}  net {:>12}  balance {:>12}",
            day.date.format(DATE_FORMAT),
            day.inflow,
            day.outflow,
            day.net,
            day.balance
        );
    }
    let totals = &projection.totals;
    let _ = write!(
        out,
        "\nTotals: in {}, out {}, net {}, closing {} ({} estimated)",
        totals.inflow, totals.outflow, totals.net, totals.closing_balance, totals.estimated_count
    );
    out
}

pub fn usage() -> String {
    "Usage: cashflow_cli <command>\n\
     Commands:\n  \
     settle <YYYY-MM-DD> <closing-day> <month-offset> <payment-day>\n  \
     cycle <closing-day> <month-offset> <payment-day>\n  \
     occurrences <start> <monthly|yearly> <day> [month] [--end <date>] [--months N]\n  \
     extend [owner]\n  \
     recalc <owner> <project-id> <YYYY-MM-DD>\n  \
     project <owner> <opening-balance> <from> <to>\n  \
     script <file>\n  \
     version\n\
     Days accept 1-28, or 99 for the last day of the month."
        .to_string()
}

struct ArgCursor<'a> {
    args: std::slice::Iter<'a, String>,
}

impl<'a> ArgCursor<'a> {
    fn new(args: &'a [String]) -> Self {
        Self { args: args.iter() }
    }

    fn next(&mut self) -> Option<&'a str> {
        self.args.next().map(String::as_str)
    }

    fn required(&mut self, usage: &str) -> Result<&'a str> {
        self.next()
            .ok_or_else(|| PlannerError::Usage(format!("missing argument\nusage: {usage}")))
    }

    fn finish(&mut self, usage: &str) -> Result<()> {
        match self.next() {
            None => Ok(()),
            Some(extra) => Err(PlannerError::Usage(format!(
                "unexpected argument '{extra}'\nusage: {usage}"
            ))),
        }
    }
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
        PlannerError::InvalidInput(format!("invalid date '{value}' (expected YYYY-MM-DD)"))
    })
}

fn parse_number<T: FromStr>(value: &str, what: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| PlannerError::InvalidInput(format!("invalid {what} '{value}'")))
}

fn parse_decimal(value: &str) -> Result<Decimal> {
    Decimal::from_str(value)
        .map_err(|_| PlannerError::InvalidInput(format!("invalid amount '{value}'")))
}

fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| PlannerError::InvalidInput(format!("invalid project id '{value}'")))
}
