//! Core entity types for the equity ledger.
//!
//! With the `typescript` feature enabled, these types can be exported to
//! TypeScript using ts-rs for the dashboard front end.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::error::EquityError;

/// Sequential employee identifier, rendered as `E001`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(transparent)]
pub struct EmployeeId(pub u32);

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:03}", self.0)
    }
}

impl FromStr for EmployeeId {
    type Err = EquityError;

    /// Accepts both `E007` and `7`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches(['E', 'e']);
        digits
            .parse::<u32>()
            .map(EmployeeId)
            .map_err(|_| EquityError::validation(format!("invalid employee id: {s}")))
    }
}

/// Sequential grant identifier, rendered as `G0001`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(transparent)]
pub struct GrantId(pub u32);

impl fmt::Display for GrantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G{:04}", self.0)
    }
}

/// Employee lifecycle status.
///
/// `PendingHire -> Active -> Departed`. Both `PendingHire` and `Active` are
/// valid entry states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    PendingHire,
    Active,
    Departed,
}

impl EmployeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingHire => "pending_hire",
            Self::Active => "active",
            Self::Departed => "departed",
        }
    }

    /// Whether the state machine permits moving from `self` to `next`.
    pub fn can_transition_to(&self, next: EmployeeStatus) -> bool {
        matches!(
            (self, next),
            (Self::PendingHire, Self::Active) | (Self::Active, Self::Departed)
        )
    }

    /// Valid states for a newly registered employee.
    pub fn is_entry_state(&self) -> bool {
        matches!(self, Self::PendingHire | Self::Active)
    }
}

impl fmt::Display for EmployeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An employee record. Never physically deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub department: String,
    /// Level code; unknown levels resolve to zero standard shares
    pub level: String,
    pub status: EmployeeStatus,
    /// Registration date, replaced by the hire date on `process_hire`
    pub join_date: NaiveDate,
    #[serde(default)]
    pub leave_date: Option<NaiveDate>,
    #[serde(default)]
    pub leave_reason: Option<String>,
}

impl Employee {
    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Active
    }
}

/// Grant lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum GrantStatus {
    Active,
    Terminated,
}

/// Why a grant was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum GrantReason {
    Hire,
    Promotion,
}

impl GrantReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hire => "hire",
            Self::Promotion => "promotion",
        }
    }
}

/// Shares allocated to one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct EquityGrant {
    pub id: GrantId,
    /// Weak reference; the grant does not own the employee
    pub employee_id: EmployeeId,
    pub granted_shares: u64,
    /// Always `<= granted_shares`
    pub vested_shares: u64,
    /// Descriptive label only, no schedule engine behind it
    pub vesting_schedule: String,
    pub status: GrantStatus,
    pub grant_date: NaiveDate,
    pub reason: GrantReason,
}

impl EquityGrant {
    pub fn unvested_shares(&self) -> u64 {
        self.granted_shares.saturating_sub(self.vested_shares)
    }

    pub fn is_active(&self) -> bool {
        self.status == GrantStatus::Active
    }
}

/// Type tag for pool ledger entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Pool (re)initialized; always carries a zero delta
    Initialize,
    /// Outstanding grants carried into a re-initialized pool
    Carryover,
    /// Shares debited for a new grant
    Grant,
    /// Unvested shares credited back on departure
    Reclaim,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Carryover => "carryover",
            Self::Grant => "grant",
            Self::Reclaim => "reclaim",
        }
    }
}

/// One append-only entry in the stock pool ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct PoolTransaction {
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub kind: TransactionKind,
    pub description: String,
    pub delta: i64,
    pub balance_after: i64,
}

/// Planned hiring demand for one (department, level, year).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct HeadcountPlanEntry {
    pub department: String,
    pub level: String,
    /// At least 1
    pub planned_count: u32,
    pub year: i32,
}

impl HeadcountPlanEntry {
    pub fn same_key(&self, department: &str, level: &str, year: i32) -> bool {
        self.department == department && self.level == level && self.year == year
    }
}

/// A single level standard, as returned by list snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct LevelStandard {
    pub level: String,
    pub shares: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_rendering() {
        assert_eq!(EmployeeId(1).to_string(), "E001");
        assert_eq!(EmployeeId(1234).to_string(), "E1234");
        assert_eq!(GrantId(12).to_string(), "G0012");
    }

    #[test]
    fn test_employee_id_parse() {
        assert_eq!("E007".parse::<EmployeeId>().unwrap(), EmployeeId(7));
        assert_eq!("12".parse::<EmployeeId>().unwrap(), EmployeeId(12));
        assert!("EX".parse::<EmployeeId>().is_err());
    }

    #[test]
    fn test_status_transitions() {
        use EmployeeStatus::*;
        assert!(PendingHire.can_transition_to(Active));
        assert!(Active.can_transition_to(Departed));
        assert!(!PendingHire.can_transition_to(Departed));
        assert!(!Departed.can_transition_to(Active));
        assert!(!Active.can_transition_to(Active));
        assert!(!Departed.is_entry_state());
    }

    #[test]
    fn test_unvested_shares() {
        let grant = EquityGrant {
            id: GrantId(1),
            employee_id: EmployeeId(1),
            granted_shares: 100,
            vested_shares: 30,
            vesting_schedule: "4-year".to_string(),
            status: GrantStatus::Active,
            grant_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            reason: GrantReason::Hire,
        };
        assert_eq!(grant.unvested_shares(), 70);
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&EmployeeStatus::PendingHire).unwrap();
        assert_eq!(json, "\"pending_hire\"");
        let id: EmployeeId = serde_json::from_str("3").unwrap();
        assert_eq!(id, EmployeeId(3));
    }
}
