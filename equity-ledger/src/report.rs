//! Read-only dashboard figures derived from the ledger state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::admin::EquityAdmin;
use crate::types::{EmployeeId, EmployeeStatus};

/// Pool usage classification against the configured thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageLevel {
    Normal,
    Warning,
    Critical,
}

impl UsageLevel {
    /// Thresholds are exclusive: a rate exactly at the threshold is not over it.
    pub fn classify(usage_rate: f64, warning: f64, critical: f64) -> Self {
        if usage_rate > critical {
            Self::Critical
        } else if usage_rate > warning {
            Self::Warning
        } else {
            Self::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeRow {
    pub id: EmployeeId,
    pub name: String,
    pub department: String,
    pub level: String,
    pub status: EmployeeStatus,
    /// Standard shares for the current level, 0 when unknown
    pub standard_shares: u64,
    pub granted: u64,
    pub vested: u64,
    pub unvested: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DepartmentRollup {
    pub department: String,
    pub active_headcount: usize,
    pub active_granted: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeadcountSummary {
    pub pending_hire: usize,
    pub active: usize,
    pub departed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub total_capacity: u64,
    pub balance: i64,
    pub current_usage: u64,
    pub usage_rate: f64,
    pub usage_level: UsageLevel,
    /// Shares the headcount plan would consume at current standards
    pub required_shares: u64,
    /// `balance / (required_shares / 12)`; `None` without plan demand
    pub sustainable_months: Option<f64>,
    pub headcount: HeadcountSummary,
    pub employees: Vec<EmployeeRow>,
    pub departments: Vec<DepartmentRollup>,
}

impl Report {
    pub fn build(admin: &EquityAdmin) -> Self {
        let settings = admin.settings();
        let pool = admin.pool();
        let grants = admin.grant_ledger();
        let usage_rate = admin.usage_rate();
        let required_shares = admin.required_shares();

        let sustainable_months = if required_shares == 0 {
            None
        } else {
            let monthly = required_shares as f64 / 12.0;
            Some((pool.balance() as f64 / monthly).max(0.0))
        };

        let mut headcount = HeadcountSummary::default();
        let mut departments: BTreeMap<String, DepartmentRollup> = BTreeMap::new();
        let mut employees = Vec::new();

        for employee in admin.registry().list() {
            let held = grants.for_employee(employee.id);
            let active_granted: u64 = held
                .iter()
                .filter(|g| g.is_active())
                .map(|g| g.granted_shares)
                .sum();

            match employee.status {
                EmployeeStatus::PendingHire => headcount.pending_hire += 1,
                EmployeeStatus::Active => {
                    headcount.active += 1;
                    let rollup = departments
                        .entry(employee.department.clone())
                        .or_insert_with(|| DepartmentRollup {
                            department: employee.department.clone(),
                            ..Default::default()
                        });
                    rollup.active_headcount += 1;
                    rollup.active_granted += active_granted;
                }
                EmployeeStatus::Departed => headcount.departed += 1,
            }

            employees.push(EmployeeRow {
                id: employee.id,
                name: employee.name.clone(),
                department: employee.department.clone(),
                level: employee.level.clone(),
                status: employee.status,
                standard_shares: admin.level_table().get(&employee.level),
                granted: held.iter().map(|g| g.granted_shares).sum(),
                vested: held.iter().map(|g| g.vested_shares).sum(),
                unvested: grants.reclaimable_for(employee.id),
            });
        }

        Self {
            generated_at: Utc::now(),
            total_capacity: pool.total_capacity(),
            balance: pool.balance(),
            current_usage: admin.current_usage(),
            usage_rate,
            usage_level: UsageLevel::classify(
                usage_rate,
                settings.warning_threshold,
                settings.critical_threshold,
            ),
            required_shares,
            sustainable_months,
            headcount,
            employees,
            departments: departments.into_values().collect(),
        }
    }

    /// Human-readable warnings for the dashboard. Never blocking.
    pub fn advisories(&self) -> Vec<String> {
        let mut out = Vec::new();
        match self.usage_level {
            UsageLevel::Critical => out.push(format!(
                "Critical: pool usage at {:.1}%",
                self.usage_rate * 100.0
            )),
            UsageLevel::Warning => out.push(format!(
                "Warning: pool usage at {:.1}%",
                self.usage_rate * 100.0
            )),
            UsageLevel::Normal => {}
        }
        if self.required_shares as i128 > self.balance as i128 {
            out.push(format!(
                "Headcount plan needs {} shares but only {} remain",
                self.required_shares, self.balance
            ));
        }
        if self.balance < 0 {
            out.push(format!("Pool is over-allocated by {} shares", -self.balance));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EquityConfig;

    #[test]
    fn test_classify() {
        assert_eq!(UsageLevel::classify(0.5, 0.8, 0.9), UsageLevel::Normal);
        assert_eq!(UsageLevel::classify(0.8, 0.8, 0.9), UsageLevel::Normal);
        assert_eq!(UsageLevel::classify(0.85, 0.8, 0.9), UsageLevel::Warning);
        assert_eq!(UsageLevel::classify(0.95, 0.8, 0.9), UsageLevel::Critical);
    }

    #[test]
    fn test_report_figures() {
        let mut config = EquityConfig::default();
        config.pool.total_capacity = 1_000_000;
        let mut admin = EquityAdmin::new(&config).unwrap();
        admin
            .add_employee("Alice", "Engineering", "P7", EmployeeStatus::Active)
            .unwrap();
        admin
            .add_employee("Bob", "Engineering", "P6", EmployeeStatus::Active)
            .unwrap();
        admin
            .add_employee("Carol", "Product", "P8", EmployeeStatus::PendingHire)
            .unwrap();
        admin.upsert_headcount_plan("Engineering", "P7", 6, 2025).unwrap();

        let report = admin.report();
        assert_eq!(report.current_usage, 60_000);
        assert_eq!(report.balance, 940_000);
        assert!((report.usage_rate - 0.06).abs() < 1e-9);
        assert_eq!(report.usage_level, UsageLevel::Normal);
        assert_eq!(report.required_shares, 240_000);
        // 940_000 / (240_000 / 12) = 47 months
        assert!((report.sustainable_months.unwrap() - 47.0).abs() < 1e-9);
        assert_eq!(report.headcount.active, 2);
        assert_eq!(report.headcount.pending_hire, 1);
        assert_eq!(report.departments.len(), 1);
        assert_eq!(report.departments[0].active_granted, 60_000);
        assert_eq!(report.employees[2].standard_shares, 80_000);
        assert!(report.advisories().is_empty());
    }

    #[test]
    fn test_no_plan_means_no_projection() {
        let admin = EquityAdmin::new(&EquityConfig::default()).unwrap();
        let report = admin.report();
        assert_eq!(report.sustainable_months, None);
        assert_eq!(report.usage_rate, 0.0);
    }

    #[test]
    fn test_plan_shortfall_advisory() {
        let mut config = EquityConfig::default();
        config.pool.total_capacity = 50_000;
        let mut admin = EquityAdmin::new(&config).unwrap();
        admin.upsert_headcount_plan("Sales", "P8", 1, 2025).unwrap();
        let advisories = admin.report().advisories();
        assert_eq!(advisories.len(), 1);
        assert!(advisories[0].contains("80000"));
    }
}
