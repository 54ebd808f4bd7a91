//! Whole-state export and import.
//!
//! A snapshot holds the five ledger structures plus export metadata. Import
//! validates everything before anything is replaced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::admin::EquityAdmin;
use crate::error::{EquityError, Result};
use crate::grants::GrantLedger;
use crate::levels::LevelStandardTable;
use crate::plan::HeadcountPlan;
use crate::pool::StockPool;
use crate::registry::EmployeeRegistry;
use crate::types::{
    Employee, EmployeeStatus, EquityGrant, HeadcountPlanEntry, PoolTransaction,
};

/// Top-level keys an import must carry.
pub const REQUIRED_KEYS: [&str; 3] = ["level_standards", "employees", "pool"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub snapshot_id: Option<Uuid>,
    #[serde(default)]
    pub exported_at: Option<DateTime<Utc>>,
    pub level_standards: LevelStandardTable,
    #[serde(default)]
    pub headcount_plan: Vec<HeadcountPlanEntry>,
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub grants: Vec<EquityGrant>,
    pub pool: PoolSnapshot,
    /// SHA-256 over the pool history, checked on import when present
    #[serde(default)]
    pub ledger_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub total_capacity: u64,
    /// Defaults to the replayed balance when absent
    #[serde(default)]
    pub balance: Option<i64>,
    #[serde(default)]
    pub transactions: Vec<PoolTransaction>,
}

/// Validated components ready to replace the live state.
pub(crate) struct SnapshotParts {
    pub levels: LevelStandardTable,
    pub plan: HeadcountPlan,
    pub employees: EmployeeRegistry,
    pub grants: GrantLedger,
    pub pool: StockPool,
}

impl Snapshot {
    pub(crate) fn capture(admin: &EquityAdmin) -> Self {
        let pool = admin.pool();
        Self {
            snapshot_id: Some(Uuid::new_v4()),
            exported_at: Some(Utc::now()),
            level_standards: admin.level_table().clone(),
            headcount_plan: admin.headcount_plan().to_vec(),
            employees: admin.employees().into_iter().cloned().collect(),
            grants: admin.grants().to_vec(),
            pool: PoolSnapshot {
                total_capacity: pool.total_capacity(),
                balance: Some(pool.balance()),
                transactions: pool.transactions().to_vec(),
            },
            ledger_hash: Some(pool.ledger_hash()),
        }
    }

    /// Parse a JSON snapshot, reporting every missing required key.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| EquityError::import(format!("invalid JSON: {e}")))?;
        let object = value
            .as_object()
            .ok_or_else(|| EquityError::import("snapshot must be a JSON object"))?;

        let missing: Vec<&str> = REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| !object.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(EquityError::import(format!(
                "missing required keys: {}",
                missing.join(", ")
            )));
        }

        serde_json::from_value(value).map_err(|e| EquityError::import(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Validate and split into live components.
    pub(crate) fn into_parts(self) -> Result<SnapshotParts> {
        if self
            .level_standards
            .list()
            .iter()
            .any(|s| s.level.trim().is_empty())
        {
            return Err(EquityError::import("level standard with blank level code"));
        }

        let plan = HeadcountPlan::from_entries(self.headcount_plan)?;
        let employees = EmployeeRegistry::from_records(self.employees)?;
        let grants = GrantLedger::from_records(self.grants)?;
        check_grant_owners(&employees, &grants)?;

        let pool = StockPool::from_parts(
            self.pool.total_capacity,
            self.pool.transactions,
            self.pool.balance,
        )?;
        if let Some(expected) = self.ledger_hash {
            let actual = pool.ledger_hash();
            if expected != actual {
                return Err(EquityError::import(format!(
                    "ledger hash mismatch: expected {expected}, computed {actual}"
                )));
            }
        }

        Ok(SnapshotParts {
            levels: self.level_standards,
            plan,
            employees,
            grants,
            pool,
        })
    }
}

/// Every grant must reference a known employee, and only active employees
/// may hold active grants.
fn check_grant_owners(employees: &EmployeeRegistry, grants: &GrantLedger) -> Result<()> {
    for grant in grants.list() {
        let owner = employees.get(grant.employee_id).map_err(|_| {
            EquityError::import(format!(
                "grant {} references unknown employee {}",
                grant.id, grant.employee_id
            ))
        })?;
        match owner.status {
            EmployeeStatus::PendingHire => {
                return Err(EquityError::import(format!(
                    "grant {} belongs to pending hire {}",
                    grant.id, owner.id
                )));
            }
            EmployeeStatus::Departed if grant.is_active() => {
                return Err(EquityError::import(format!(
                    "active grant {} belongs to departed employee {}",
                    grant.id, owner.id
                )));
            }
            _ => {}
        }
    }
    Ok(())
}
