mod common;

use assert_cmd::Command;
use cashflow_planner::{
    cli::HOME_ENV,
    core::{ReferenceStore, TransactionStore},
    domain::{Client, PaymentTerms, Project, Transaction, TransactionKind},
    storage::JsonPlannerStore,
};
use common::{temp_home, ymd, OWNER};
use predicates::str::contains;
use rust_decimal::Decimal;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("cashflow_cli").expect("binary builds");
    cmd.env(HOME_ENV, temp_home());
    cmd
}

#[test]
fn settle_prints_the_settlement_date() {
    cli()
        .args(["settle", "2024-01-31", "99", "1", "99"])
        .assert()
        .success()
        .stdout(contains("2024-02-29"));
}

#[test]
fn cycle_describes_payment_terms() {
    cli()
        .args(["cycle", "25", "1", "10"])
        .assert()
        .success()
        .stdout(contains("Closes on the 25th, paid on the 10th of the following month"));
}

#[test]
fn invalid_input_exits_with_error() {
    cli()
        .args(["settle", "2024-01-31", "30", "1", "10"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("Error:"));
}

#[test]
fn version_reports_build_metadata() {
    cli()
        .arg("version")
        .assert()
        .success()
        .stdout(contains(format!("cashflow_cli {}", env!("CARGO_PKG_VERSION"))));
}

#[test]
fn recalc_updates_stored_transactions() {
    let home = temp_home();
    let store = JsonPlannerStore::new(home.join("data")).expect("store");
    let client = Client::new(OWNER, "Acme", PaymentTerms::from_raw(25, 1, 10).unwrap());
    let project = Project::new(OWNER, "Website").with_client(client.id);
    store.save_client(OWNER, &client).unwrap();
    store.save_project(OWNER, &project).unwrap();
    let mut invoice = Transaction::draft(
        OWNER,
        TransactionKind::Income,
        Decimal::new(5000, 0),
        "Final invoice",
        ymd(2024, 1, 10),
    );
    invoice.project_id = Some(project.id);
    store.insert(OWNER, vec![invoice]).unwrap();

    let project_id = project.id.to_string();
    Command::cargo_bin("cashflow_cli")
        .expect("binary builds")
        .env(HOME_ENV, &home)
        .args(["recalc", OWNER, project_id.as_str(), "2024-03-26"])
        .assert()
        .success()
        .stdout(contains("1 updated, 0 skipped"));

    let stored = store.transactions(OWNER).unwrap();
    assert_eq!(stored[0].settlement_date, Some(ymd(2024, 5, 10)));
    assert_eq!(store.projects(OWNER).unwrap()[0].end_date, Some(ymd(2024, 3, 26)));
}

#[test]
fn script_mode_runs_each_line() {
    let home = temp_home();
    let script = home.join("plan.txt");
    std::fs::write(
        &script,
        "# settlement checks\n\
         settle 2024-01-20 25 1 10\n\
         \n\
         occurrences 2024-01-31 monthly 31 --end \"2024-03-31\"\n\
         project studio 250 2024-01-01 2024-01-31\n",
    )
    .unwrap();

    Command::cargo_bin("cashflow_cli")
        .expect("binary builds")
        .env(HOME_ENV, &home)
        .arg("script")
        .arg(&script)
        .assert()
        .success()
        .stdout(contains("2024-02-10"))
        .stdout(contains("2024-02-29"))
        .stdout(contains("closing 250"));
}
