//! Facade tying the engine to a store, a clock, and the configured horizon.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use cashflow_config::{Config, ConfigManager, RecurrenceSettings};
use cashflow_core::{
    estimate_transactions, generate_extension_transactions, generate_transactions_within,
    latest_instance_date, needs_auto_extension, project_cash_position, recalculate_settlement,
    CashFlowProjection, Clock, CoreError, RecalculationResult, RecurrenceHorizon, ReferenceStore,
    TransactionStore,
};
use cashflow_domain::{DateWindow, RecurringMaster};
use cashflow_storage_json::JsonPlannerStore;

use crate::{Result, SystemClock};

/// Counts reported by [`CashFlowPlanner::extend_recurring`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtensionReport {
    pub masters_checked: usize,
    pub masters_extended: usize,
    pub transactions_created: usize,
}

pub struct CashFlowPlanner<S> {
    store: S,
    horizon: RecurrenceHorizon,
    clock: Arc<dyn Clock>,
}

impl<S> CashFlowPlanner<S>
where
    S: TransactionStore + ReferenceStore,
{
    pub fn new(store: S, horizon: RecurrenceHorizon, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            horizon,
            clock,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn horizon(&self) -> RecurrenceHorizon {
        self.horizon
    }

    /// Saves the master and materializes its first window. Returns the ids of
    /// the inserted instances.
    pub fn create_recurring(&self, owner_id: &str, master: &RecurringMaster) -> Result<Vec<Uuid>> {
        master.validate()?;
        self.store.save_recurring_master(owner_id, master)?;

        let clients = self.store.clients(owner_id)?;
        let drafts =
            generate_transactions_within(master, &clients, owner_id, self.horizon.initial_months);
        if drafts.is_empty() {
            debug!(master = %master.id, "no instances in the initial window");
            return Ok(Vec::new());
        }
        let ids = self.store.insert(owner_id, drafts)?;
        info!(master = %master.id, created = ids.len(), "recurring master materialized");
        Ok(ids)
    }

    /// Tops up every open-ended master whose latest instance is inside the
    /// extension threshold of today.
    pub fn extend_recurring(&self, owner_id: &str) -> Result<ExtensionReport> {
        let masters = self.store.recurring_masters(owner_id)?;
        let clients = self.store.clients(owner_id)?;
        let existing = self.store.transactions(owner_id)?;
        let today = self.clock.today();

        let mut report = ExtensionReport::default();
        for master in &masters {
            report.masters_checked += 1;
            if !needs_auto_extension(master, &existing, today, self.horizon.threshold_months) {
                continue;
            }
            let drafts = generate_extension_transactions(
                master,
                &existing,
                &clients,
                owner_id,
                self.horizon.extension_months,
            );
            if drafts.is_empty() {
                continue;
            }
            let created = self.store.insert(owner_id, drafts)?.len();
            report.masters_extended += 1;
            report.transactions_created += created;
            info!(master = %master.id, created, "recurring master extended");
        }
        Ok(report)
    }

    /// Moves the project's end date and shifts its income settlements with it.
    /// The new end date is stored only when the recalculation succeeded.
    pub fn update_project_end_date(
        &self,
        owner_id: &str,
        project_id: Uuid,
        new_end_date: NaiveDate,
    ) -> Result<RecalculationResult> {
        let mut project = self
            .store
            .projects(owner_id)?
            .into_iter()
            .find(|project| project.id == project_id)
            .ok_or(CoreError::ProjectNotFound(project_id))?;
        let clients = self.store.clients(owner_id)?;

        let result = recalculate_settlement(&self.store, owner_id, &project, new_end_date, &clients);
        if result.success {
            project.end_date = Some(new_end_date);
            self.store.save_project(owner_id, &project)?;
        } else {
            warn!(project = %project_id, "project end date left unchanged");
        }
        Ok(result)
    }

    /// Stored transactions plus estimates for every active master beyond its
    /// latest stored instance, run forward from `opening_balance`.
    pub fn projection(
        &self,
        owner_id: &str,
        opening_balance: Decimal,
        window: DateWindow,
    ) -> Result<CashFlowProjection> {
        let mut transactions = self.store.transactions(owner_id)?;
        let masters = self.store.recurring_masters(owner_id)?;
        let clients = self.store.clients(owner_id)?;

        let mut estimates = Vec::new();
        for master in masters.iter().filter(|master| master.is_active) {
            let horizon_end = latest_instance_date(master.id, &transactions);
            estimates.extend(estimate_transactions(
                master,
                &clients,
                owner_id,
                window,
                horizon_end,
            ));
        }
        transactions.extend(estimates);
        Ok(project_cash_position(opening_balance, &transactions, window))
    }
}

impl CashFlowPlanner<JsonPlannerStore> {
    /// JSON-backed planner on the system clock, configured from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let store = JsonPlannerStore::new(config.resolve_data_root())?;
        Ok(Self::new(
            store,
            horizon_from_settings(config.recurrence),
            Arc::new(SystemClock),
        ))
    }

    /// Loads the configuration managed by `manager` and builds a planner from it.
    pub fn from_manager(manager: &ConfigManager) -> Result<Self> {
        let config = manager.load()?;
        Self::from_config(&config)
    }
}

pub fn horizon_from_settings(settings: RecurrenceSettings) -> RecurrenceHorizon {
    RecurrenceHorizon {
        initial_months: settings.initial_months,
        threshold_months: settings.threshold_months,
        extension_months: settings.extension_months,
    }
}
