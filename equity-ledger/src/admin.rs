//! Command and query surface over the five ledger structures.
//!
//! Every command either applies completely or returns an error with the
//! state untouched. Advisories (insufficient pool on hire, usage thresholds)
//! are reported on success values, never as errors.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::EquityConfig;
use crate::error::{require_non_blank, EquityError, Result};
use crate::grants::GrantLedger;
use crate::levels::LevelStandardTable;
use crate::plan::{HeadcountPlan, PlanUpsert};
use crate::pool::StockPool;
use crate::registry::EmployeeRegistry;
use crate::report::{Report, UsageLevel};
use crate::snapshot::Snapshot;
use crate::types::*;

/// Non-blocking warning attached to a successful command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    /// A grant was due but the pool could not cover it
    InsufficientPool {
        employee_id: EmployeeId,
        requested: u64,
        available: i64,
    },
    /// Usage rate crossed the warning threshold
    UsageWarning { usage_rate: f64 },
    /// Usage rate crossed the critical threshold
    UsageCritical { usage_rate: f64 },
}

impl std::fmt::Display for Advisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientPool {
                employee_id,
                requested,
                available,
            } => write!(
                f,
                "No grant issued to {employee_id}: needs {requested} shares, pool has {available}"
            ),
            Self::UsageWarning { usage_rate } => {
                write!(f, "Pool usage at {:.1}%, above warning threshold", usage_rate * 100.0)
            }
            Self::UsageCritical { usage_rate } => {
                write!(f, "Pool usage at {:.1}%, above critical threshold", usage_rate * 100.0)
            }
        }
    }
}

/// A grant created by a command, with the pool balance right after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrantIssued {
    pub grant_id: GrantId,
    pub shares: u64,
    pub balance_after: i64,
}

/// Outcome of `add_employee` and `process_hire`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryOutcome {
    pub employee_id: EmployeeId,
    pub status: EmployeeStatus,
    pub grant: Option<GrantIssued>,
    pub advisories: Vec<Advisory>,
    pub balance: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartureOutcome {
    pub employee_id: EmployeeId,
    pub terminated: Vec<GrantId>,
    pub reclaimed: u64,
    pub balance: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromotionOutcome {
    pub employee_id: EmployeeId,
    pub from_level: String,
    pub to_level: String,
    /// `standard(to) - standard(from)`
    pub standard_delta: i64,
    pub grant: Option<GrantIssued>,
    pub advisories: Vec<Advisory>,
    pub balance: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolInitialized {
    pub total_capacity: u64,
    pub carried_over: u64,
    pub balance: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanOutcome {
    pub upsert: PlanUpsertKind,
    pub required_shares: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanUpsertKind {
    Inserted,
    Replaced,
}

/// Thresholds and labels that shape command behavior but are not part of
/// the exported state.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerSettings {
    pub warning_threshold: f64,
    pub critical_threshold: f64,
    pub vesting_schedule: String,
}

impl From<&EquityConfig> for LedgerSettings {
    fn from(config: &EquityConfig) -> Self {
        Self {
            warning_threshold: config.pool.warning_threshold,
            critical_threshold: config.pool.critical_threshold,
            vesting_schedule: config.pool.vesting_schedule.clone(),
        }
    }
}

/// Owned application state: level standards, headcount plan, employees,
/// grants and the stock pool.
#[derive(Debug, Clone, PartialEq)]
pub struct EquityAdmin {
    levels: LevelStandardTable,
    plan: HeadcountPlan,
    employees: EmployeeRegistry,
    grants: GrantLedger,
    pool: StockPool,
    settings: LedgerSettings,
}

impl EquityAdmin {
    /// Fresh state seeded from configuration. Fails when the configured
    /// capacity is above `pool::MAX_CAPACITY`.
    pub fn new(config: &EquityConfig) -> Result<Self> {
        Ok(Self {
            levels: config.level_table(),
            plan: HeadcountPlan::new(),
            employees: EmployeeRegistry::new(),
            grants: GrantLedger::new(),
            pool: StockPool::new(config.pool.total_capacity)?,
            settings: LedgerSettings::from(config),
        })
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Insert or overwrite a level standard. Existing grants are untouched.
    pub fn set_level_standard(&mut self, level: &str, shares: u64) -> Result<Option<u64>> {
        let previous = self.levels.set(level, shares)?;
        info!(level = %level.trim(), shares, ?previous, "Set level standard");
        Ok(previous)
    }

    pub fn delete_level_standard(&mut self, level: &str) -> Result<u64> {
        let removed = self.levels.delete(level)?;
        info!(level = %level, shares = removed, "Deleted level standard");
        Ok(removed)
    }

    pub fn upsert_headcount_plan(
        &mut self,
        department: &str,
        level: &str,
        planned_count: u32,
        year: i32,
    ) -> Result<PlanOutcome> {
        let upsert = match self.plan.upsert(department, level, planned_count, year)? {
            PlanUpsert::Inserted => PlanUpsertKind::Inserted,
            PlanUpsert::Replaced { previous_count } => {
                debug!(previous_count, "Replaced headcount plan entry");
                PlanUpsertKind::Replaced
            }
        };
        let required_shares = self.plan.required_shares(&self.levels);
        info!(
            department = %department.trim(),
            level = %level.trim(),
            planned_count,
            year,
            required_shares,
            "Upserted headcount plan"
        );
        Ok(PlanOutcome {
            upsert,
            required_shares,
        })
    }

    /// Register an employee. Registering directly as `Active` issues the
    /// level's standard grant exactly as `process_hire` would.
    pub fn add_employee(
        &mut self,
        name: &str,
        department: &str,
        level: &str,
        status: EmployeeStatus,
    ) -> Result<EntryOutcome> {
        if status == EmployeeStatus::Active {
            self.grants.ensure_next_id()?;
        }
        let employee_id = self
            .employees
            .add(name, department, level, status, today())?;
        info!(employee_id = %employee_id, status = %status, "Added employee");

        let (grant, advisories) = if status == EmployeeStatus::Active {
            self.issue_on_entry(employee_id)?
        } else {
            (None, Vec::new())
        };

        Ok(EntryOutcome {
            employee_id,
            status,
            grant,
            advisories,
            balance: self.pool.balance(),
        })
    }

    /// `PendingHire -> Active`. The hire stands even when the pool cannot
    /// cover the standard grant; that case is returned as an advisory.
    pub fn process_hire(&mut self, employee_id: EmployeeId) -> Result<EntryOutcome> {
        self.employees
            .require_transition(employee_id, EmployeeStatus::Active)?;
        self.grants.ensure_next_id()?;

        let employee = self.employees.get_mut(employee_id)?;
        employee.status = EmployeeStatus::Active;
        employee.join_date = today();
        info!(employee_id = %employee_id, "Processed hire");

        let (grant, advisories) = self.issue_on_entry(employee_id)?;
        Ok(EntryOutcome {
            employee_id,
            status: EmployeeStatus::Active,
            grant,
            advisories,
            balance: self.pool.balance(),
        })
    }

    /// `Active -> Departed`. Terminates every active grant and credits the
    /// unvested remainder back to the pool. Vested shares stay with the
    /// employee.
    pub fn process_departure(
        &mut self,
        employee_id: EmployeeId,
        leave_date: NaiveDate,
        reason: &str,
    ) -> Result<DepartureOutcome> {
        require_non_blank("reason", reason)?;
        let employee = self
            .employees
            .require_transition(employee_id, EmployeeStatus::Departed)?;
        if leave_date < employee.join_date {
            return Err(EquityError::validation(format!(
                "leave date {leave_date} is before join date {}",
                employee.join_date
            )));
        }
        let name = employee.name.clone();
        self.pool
            .ensure_creditable(self.grants.reclaimable_for(employee_id))?;

        let termination = self.grants.terminate_for_employee(employee_id);
        if termination.unvested_total > 0 {
            self.pool.credit(
                termination.unvested_total,
                format!(
                    "Reclaimed {} unvested shares from {employee_id} ({name}) on departure",
                    termination.unvested_total
                ),
            )?;
        }

        let employee = self.employees.get_mut(employee_id)?;
        employee.status = EmployeeStatus::Departed;
        employee.leave_date = Some(leave_date);
        employee.leave_reason = Some(reason.trim().to_string());

        info!(
            employee_id = %employee_id,
            grants = termination.terminated.len(),
            reclaimed = termination.unvested_total,
            balance = self.pool.balance(),
            "Processed departure"
        );

        Ok(DepartureOutcome {
            employee_id,
            terminated: termination.terminated,
            reclaimed: termination.unvested_total,
            balance: self.pool.balance(),
        })
    }

    /// Change the level of an active employee.
    ///
    /// A higher standard requires a grant for the difference; if the pool
    /// cannot cover it the promotion fails with `InsufficientPool` and the
    /// level stays as it was. A lower or equal standard just moves the level.
    pub fn process_promotion(
        &mut self,
        employee_id: EmployeeId,
        new_level: &str,
    ) -> Result<PromotionOutcome> {
        require_non_blank("level", new_level)?;
        let new_level = new_level.trim();
        let employee = self
            .employees
            .require_status(employee_id, EmployeeStatus::Active)?;
        if employee.level == new_level {
            return Err(EquityError::invalid_transition(
                employee_id,
                format!("already at level {new_level}"),
            ));
        }
        let from_level = employee.level.clone();

        let from_standard = self.levels.get(&from_level);
        let to_standard = self.levels.get(new_level);
        let standard_delta = signed(to_standard) - signed(from_standard);

        let grant = if to_standard > from_standard {
            let shares = to_standard - from_standard;
            match self.issue_grant(employee_id, shares, GrantReason::Promotion) {
                Ok(issued) => Some(issued),
                Err(e) => {
                    warn!(
                        employee_id = %employee_id,
                        from = %from_level,
                        to = %new_level,
                        error = %e,
                        "Promotion rejected"
                    );
                    return Err(e);
                }
            }
        } else {
            None
        };

        self.employees.get_mut(employee_id)?.level = new_level.to_string();
        info!(
            employee_id = %employee_id,
            from = %from_level,
            to = %new_level,
            standard_delta,
            "Processed promotion"
        );

        let advisories = if grant.is_some() {
            self.usage_advisories()
        } else {
            Vec::new()
        };

        Ok(PromotionOutcome {
            employee_id,
            from_level,
            to_level: new_level.to_string(),
            standard_delta,
            grant,
            advisories,
            balance: self.pool.balance(),
        })
    }

    /// Reset pool capacity and history. Shares held by active grants are
    /// carried into the new pool.
    pub fn initialize_pool(&mut self, total_capacity: u64) -> Result<PoolInitialized> {
        let carried_over = self.grants.current_usage();
        self.pool.initialize(total_capacity, carried_over)?;
        info!(total_capacity, carried_over, balance = self.pool.balance(), "Initialized pool");
        Ok(PoolInitialized {
            total_capacity,
            carried_over,
            balance: self.pool.balance(),
        })
    }

    /// Record vesting progress reported by an external vesting feed.
    pub fn record_vesting(&mut self, grant_id: GrantId, vested_total: u64) -> Result<&EquityGrant> {
        let grant = self.grants.record_vesting(grant_id, vested_total)?;
        debug!(grant_id = %grant_id, vested_total, "Recorded vesting");
        Ok(grant)
    }

    // ------------------------------------------------------------------
    // Grant issuance
    // ------------------------------------------------------------------

    /// Create an active grant and debit the pool, or fail with
    /// `InsufficientPool` without touching anything. The debit cannot fail
    /// once `ensure_available` has passed.
    fn issue_grant(
        &mut self,
        employee_id: EmployeeId,
        shares: u64,
        reason: GrantReason,
    ) -> Result<GrantIssued> {
        let employee = self.employees.get(employee_id)?;
        self.pool.ensure_available(shares)?;
        let name = employee.name.clone();

        let grant_id = self.grants.create(
            employee_id,
            shares,
            &self.settings.vesting_schedule,
            today(),
            reason,
        )?;
        let tx = self.pool.debit(
            shares,
            format!(
                "Grant {grant_id} of {shares} shares to {employee_id} ({name}) on {}",
                reason.as_str()
            ),
        )?;
        let balance_after = tx.balance_after;

        info!(
            grant_id = %grant_id,
            employee_id = %employee_id,
            shares,
            balance = balance_after,
            "Issued grant"
        );
        Ok(GrantIssued {
            grant_id,
            shares,
            balance_after,
        })
    }

    /// Standard grant for an employee entering the `Active` state, shared by
    /// `add_employee` and `process_hire`. Pool shortfall becomes an advisory.
    fn issue_on_entry(
        &mut self,
        employee_id: EmployeeId,
    ) -> Result<(Option<GrantIssued>, Vec<Advisory>)> {
        let level = self.employees.get(employee_id)?.level.clone();
        let standard = self.levels.get(&level);
        if standard == 0 {
            debug!(employee_id = %employee_id, level = %level, "No standard grant for level");
            return Ok((None, Vec::new()));
        }

        match self.issue_grant(employee_id, standard, GrantReason::Hire) {
            Ok(issued) => Ok((Some(issued), self.usage_advisories())),
            Err(EquityError::InsufficientPool {
                requested,
                available,
            }) => {
                warn!(
                    employee_id = %employee_id,
                    requested,
                    available,
                    "Pool cannot cover standard grant; hired without grant"
                );
                Ok((
                    None,
                    vec![Advisory::InsufficientPool {
                        employee_id,
                        requested,
                        available,
                    }],
                ))
            }
            Err(e) => Err(e),
        }
    }

    fn usage_advisories(&self) -> Vec<Advisory> {
        let usage_rate = self.usage_rate();
        match UsageLevel::classify(
            usage_rate,
            self.settings.warning_threshold,
            self.settings.critical_threshold,
        ) {
            UsageLevel::Normal => Vec::new(),
            UsageLevel::Warning => {
                warn!(usage_rate, "Pool usage above warning threshold");
                vec![Advisory::UsageWarning { usage_rate }]
            }
            UsageLevel::Critical => {
                warn!(usage_rate, "Pool usage above critical threshold");
                vec![Advisory::UsageCritical { usage_rate }]
            }
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn level_standards(&self) -> Vec<LevelStandard> {
        self.levels.list()
    }

    /// Standard shares for a level, 0 when unknown.
    pub fn standard_for(&self, level: &str) -> u64 {
        self.levels.get(level)
    }

    pub fn headcount_plan(&self) -> &[HeadcountPlanEntry] {
        self.plan.entries()
    }

    pub fn required_shares(&self) -> u64 {
        self.plan.required_shares(&self.levels)
    }

    /// Shares one plan entry would consume at current standards.
    pub fn entry_required_shares(&self, entry: &HeadcountPlanEntry) -> u64 {
        entry.required_shares(&self.levels)
    }

    pub fn employees(&self) -> Vec<&Employee> {
        self.employees.list()
    }

    pub fn employee(&self, employee_id: EmployeeId) -> Result<&Employee> {
        self.employees.get(employee_id)
    }

    pub fn grants(&self) -> &[EquityGrant] {
        self.grants.list()
    }

    pub fn grants_for(&self, employee_id: EmployeeId) -> Vec<&EquityGrant> {
        self.grants.for_employee(employee_id)
    }

    pub fn pool(&self) -> &StockPool {
        &self.pool
    }

    pub fn current_usage(&self) -> u64 {
        self.grants.current_usage()
    }

    /// `current_usage / total_capacity`, 0 for an empty pool.
    pub fn usage_rate(&self) -> f64 {
        let total = self.pool.total_capacity();
        if total == 0 {
            0.0
        } else {
            self.current_usage() as f64 / total as f64
        }
    }

    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    pub fn report(&self) -> Report {
        Report::build(self)
    }

    pub(crate) fn level_table(&self) -> &LevelStandardTable {
        &self.levels
    }

    pub(crate) fn registry(&self) -> &EmployeeRegistry {
        &self.employees
    }

    pub(crate) fn grant_ledger(&self) -> &GrantLedger {
        &self.grants
    }

    // ------------------------------------------------------------------
    // Export / import
    // ------------------------------------------------------------------

    /// Serializable copy of all five structures.
    pub fn export_snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }

    /// Replace the whole state with a snapshot. On any validation failure
    /// the current state is left exactly as it was.
    pub fn import_snapshot(&mut self, snapshot: Snapshot) -> Result<()> {
        let parts = snapshot.into_parts()?;
        self.levels = parts.levels;
        self.plan = parts.plan;
        self.employees = parts.employees;
        self.grants = parts.grants;
        self.pool = parts.pool;
        info!(
            employees = self.employees.len(),
            grants = self.grants.len(),
            balance = self.pool.balance(),
            "Imported snapshot"
        );
        Ok(())
    }

    /// Parse and import a JSON snapshot.
    pub fn import_json(&mut self, json: &str) -> Result<()> {
        let snapshot = Snapshot::from_json(json)?;
        self.import_snapshot(snapshot)
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn signed(shares: u64) -> i64 {
    i64::try_from(shares).unwrap_or(i64::MAX)
}
