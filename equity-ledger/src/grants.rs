//! Equity grant ledger.
//!
//! Grants are only ever created by hire/promotion and only ever terminated by
//! departure. Nothing is deleted.

use chrono::NaiveDate;

use crate::error::{EquityError, Result};
use crate::pool::MAX_CAPACITY;
use crate::types::{EmployeeId, EquityGrant, GrantId, GrantReason, GrantStatus};

/// Result of terminating an employee's active grants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Termination {
    pub terminated: Vec<GrantId>,
    /// Sum of `granted - vested` over the terminated grants
    pub unvested_total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantLedger {
    grants: Vec<EquityGrant>,
    next_id: u32,
}

impl Default for GrantLedger {
    fn default() -> Self {
        Self {
            grants: Vec::new(),
            next_id: 1,
        }
    }
}

impl GrantLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_records(records: Vec<EquityGrant>) -> Result<Self> {
        let mut seen = std::collections::BTreeSet::new();
        let mut total: u64 = 0;
        for grant in &records {
            if !seen.insert(grant.id) {
                return Err(EquityError::import(format!("duplicate grant id {}", grant.id)));
            }
            if grant.vested_shares > grant.granted_shares {
                return Err(EquityError::import(format!(
                    "grant {} has vested {} above granted {}",
                    grant.id, grant.vested_shares, grant.granted_shares
                )));
            }
            total = total
                .checked_add(grant.granted_shares)
                .filter(|t| *t <= MAX_CAPACITY)
                .ok_or_else(|| EquityError::import("granted shares exceed the ledger range"))?;
        }
        let next_id = match seen.iter().next_back() {
            Some(last) => last
                .0
                .checked_add(1)
                .ok_or_else(|| EquityError::import("grant id space exhausted"))?,
            None => 1,
        };
        Ok(Self {
            grants: records,
            next_id,
        })
    }

    /// Append a new active grant with nothing vested.
    ///
    /// Pool accounting is the caller's job; see `EquityAdmin::issue_grant`.
    pub(crate) fn create(
        &mut self,
        employee_id: EmployeeId,
        shares: u64,
        vesting_schedule: &str,
        grant_date: NaiveDate,
        reason: GrantReason,
    ) -> Result<GrantId> {
        let id = GrantId(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| EquityError::validation("grant id space exhausted"))?;
        self.grants.push(EquityGrant {
            id,
            employee_id,
            granted_shares: shares,
            vested_shares: 0,
            vesting_schedule: vesting_schedule.to_string(),
            status: GrantStatus::Active,
            grant_date,
            reason,
        });
        Ok(id)
    }

    /// Fail unless another grant id can be assigned.
    pub(crate) fn ensure_next_id(&self) -> Result<()> {
        self.next_id
            .checked_add(1)
            .map(|_| ())
            .ok_or_else(|| EquityError::validation("grant id space exhausted"))
    }

    pub fn get(&self, id: GrantId) -> Result<&EquityGrant> {
        self.grants
            .iter()
            .find(|g| g.id == id)
            .ok_or_else(|| EquityError::not_found("Grant", id))
    }

    /// Advance the vested share count on an active grant.
    ///
    /// `vested_total` is the new cumulative figure; it may not decrease or
    /// exceed the granted shares.
    pub fn record_vesting(&mut self, id: GrantId, vested_total: u64) -> Result<&EquityGrant> {
        let grant = self
            .grants
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| EquityError::not_found("Grant", id))?;

        if !grant.is_active() {
            return Err(EquityError::invalid_transition(id, "grant is terminated"));
        }
        if vested_total < grant.vested_shares {
            return Err(EquityError::validation(format!(
                "vested shares cannot decrease ({} -> {vested_total})",
                grant.vested_shares
            )));
        }
        if vested_total > grant.granted_shares {
            return Err(EquityError::validation(format!(
                "vested shares {vested_total} exceed granted {}",
                grant.granted_shares
            )));
        }

        grant.vested_shares = vested_total;
        Ok(grant)
    }

    /// Terminate every active grant of an employee.
    pub(crate) fn terminate_for_employee(&mut self, employee_id: EmployeeId) -> Termination {
        let mut termination = Termination::default();
        for grant in self
            .grants
            .iter_mut()
            .filter(|g| g.employee_id == employee_id && g.is_active())
        {
            termination.unvested_total += grant.unvested_shares();
            termination.terminated.push(grant.id);
            grant.status = GrantStatus::Terminated;
        }
        termination
    }

    /// Unvested shares that departure would reclaim for this employee.
    pub fn reclaimable_for(&self, employee_id: EmployeeId) -> u64 {
        self.grants
            .iter()
            .filter(|g| g.employee_id == employee_id && g.is_active())
            .map(EquityGrant::unvested_shares)
            .sum()
    }

    /// Sum of granted shares over active grants, regardless of vesting.
    pub fn current_usage(&self) -> u64 {
        self.grants
            .iter()
            .filter(|g| g.is_active())
            .map(|g| g.granted_shares)
            .sum()
    }

    pub fn for_employee(&self, employee_id: EmployeeId) -> Vec<&EquityGrant> {
        self.grants
            .iter()
            .filter(|g| g.employee_id == employee_id)
            .collect()
    }

    /// All grants in issue order.
    pub fn list(&self) -> &[EquityGrant] {
        &self.grants
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}
