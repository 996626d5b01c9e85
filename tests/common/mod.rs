#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use cashflow_planner::{
    core::{FixedClock, RecurrenceHorizon},
    storage::JsonPlannerStore,
    CashFlowPlanner,
};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub const OWNER: &str = "studio";

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// A fresh directory that outlives the calling test.
pub fn temp_home() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Planner over an isolated JSON store with the clock pinned to `today`.
pub fn setup_planner(today: NaiveDate) -> CashFlowPlanner<JsonPlannerStore> {
    let store = JsonPlannerStore::new(temp_home().join("data")).expect("create json store");
    CashFlowPlanner::new(store, RecurrenceHorizon::default(), Arc::new(FixedClock(today)))
}
