//! Employee registry.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::error::{require_non_blank, EquityError, Result};
use crate::types::{Employee, EmployeeId, EmployeeStatus};

/// Employees keyed by sequential id. Records are never removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeRegistry {
    employees: BTreeMap<EmployeeId, Employee>,
    next_id: u32,
}

impl Default for EmployeeRegistry {
    fn default() -> Self {
        Self {
            employees: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl EmployeeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a registry from imported records. The id counter resumes
    /// after the highest id present.
    pub(crate) fn from_records(records: Vec<Employee>) -> Result<Self> {
        let mut employees = BTreeMap::new();
        for employee in records {
            let id = employee.id;
            if employees.insert(id, employee).is_some() {
                return Err(EquityError::import(format!("duplicate employee id {id}")));
            }
        }
        let next_id = match employees.keys().next_back() {
            Some(last) => last
                .0
                .checked_add(1)
                .ok_or_else(|| EquityError::import("employee id space exhausted"))?,
            None => 1,
        };
        Ok(Self { employees, next_id })
    }

    /// Register a new employee and assign the next id.
    ///
    /// Only entry states are accepted; the caller is responsible for any
    /// grant side effects of registering someone as `Active`.
    pub fn add(
        &mut self,
        name: &str,
        department: &str,
        level: &str,
        status: EmployeeStatus,
        join_date: NaiveDate,
    ) -> Result<EmployeeId> {
        require_non_blank("name", name)?;
        require_non_blank("department", department)?;
        require_non_blank("level", level)?;
        if !status.is_entry_state() {
            return Err(EquityError::validation(format!(
                "new employees must start as pending_hire or active, got {status}"
            )));
        }

        let id = self.peek_next_id();
        let next_id = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| EquityError::validation("employee id space exhausted"))?;
        self.employees.insert(
            id,
            Employee {
                id,
                name: name.trim().to_string(),
                department: department.trim().to_string(),
                level: level.trim().to_string(),
                status,
                join_date,
                leave_date: None,
                leave_reason: None,
            },
        );
        self.next_id = next_id;
        Ok(id)
    }

    /// The id the next `add` will assign.
    pub fn peek_next_id(&self) -> EmployeeId {
        EmployeeId(self.next_id)
    }

    pub fn get(&self, id: EmployeeId) -> Result<&Employee> {
        self.employees
            .get(&id)
            .ok_or_else(|| EquityError::not_found("Employee", id))
    }

    pub(crate) fn get_mut(&mut self, id: EmployeeId) -> Result<&mut Employee> {
        self.employees
            .get_mut(&id)
            .ok_or_else(|| EquityError::not_found("Employee", id))
    }

    /// Fetch an employee and check it is in the expected state.
    pub fn require_status(&self, id: EmployeeId, expected: EmployeeStatus) -> Result<&Employee> {
        let employee = self.get(id)?;
        if employee.status != expected {
            return Err(EquityError::invalid_transition(
                id,
                format!("expected {expected}, found {}", employee.status),
            ));
        }
        Ok(employee)
    }

    /// Fetch an employee and check the lifecycle permits moving it to `next`.
    pub fn require_transition(&self, id: EmployeeId, next: EmployeeStatus) -> Result<&Employee> {
        let employee = self.get(id)?;
        if !employee.status.can_transition_to(next) {
            return Err(EquityError::invalid_transition(
                id,
                format!("cannot move from {} to {next}", employee.status),
            ));
        }
        Ok(employee)
    }

    pub fn contains(&self, id: EmployeeId) -> bool {
        self.employees.contains_key(&id)
    }

    /// All employees in id order.
    pub fn list(&self) -> Vec<&Employee> {
        self.employees.values().collect()
    }

    pub fn len(&self) -> usize {
        self.employees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }
}
