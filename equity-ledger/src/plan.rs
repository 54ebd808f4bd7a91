//! Headcount plan: forward-looking hiring demand per department, level and year.

use crate::error::{require_non_blank, EquityError, Result};
use crate::levels::LevelStandardTable;
use crate::types::HeadcountPlanEntry;

/// Whether an upsert replaced an existing entry or appended a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanUpsert {
    Inserted,
    Replaced { previous_count: u32 },
}

impl HeadcountPlanEntry {
    /// `standard(level) * planned_count`, saturating at `u64::MAX`.
    pub fn required_shares(&self, standards: &LevelStandardTable) -> u64 {
        standards
            .get(&self.level)
            .saturating_mul(u64::from(self.planned_count))
    }
}

/// Ordered list of plan entries, unique on (department, level, year).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadcountPlan {
    entries: Vec<HeadcountPlanEntry>,
}

impl HeadcountPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entry with the same key, or append a new one.
    pub fn upsert(
        &mut self,
        department: &str,
        level: &str,
        planned_count: u32,
        year: i32,
    ) -> Result<PlanUpsert> {
        require_non_blank("department", department)?;
        require_non_blank("level", level)?;
        if planned_count == 0 {
            return Err(EquityError::validation("planned count must be at least 1"));
        }

        let department = department.trim();
        let level = level.trim();

        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.same_key(department, level, year))
        {
            let previous_count = entry.planned_count;
            entry.planned_count = planned_count;
            return Ok(PlanUpsert::Replaced { previous_count });
        }

        self.entries.push(HeadcountPlanEntry {
            department: department.to_string(),
            level: level.to_string(),
            planned_count,
            year,
        });
        Ok(PlanUpsert::Inserted)
    }

    /// Sum over entries of `standard(level) * planned_count`.
    pub fn required_shares(&self, standards: &LevelStandardTable) -> u64 {
        self.entries
            .iter()
            .map(|e| e.required_shares(standards))
            .fold(0u64, u64::saturating_add)
    }

    pub fn entries(&self) -> &[HeadcountPlanEntry] {
        &self.entries
    }

    /// Rebuild a plan from imported entries, rejecting duplicate keys.
    pub(crate) fn from_entries(entries: Vec<HeadcountPlanEntry>) -> Result<Self> {
        if let Some(bad) = entries.iter().find(|e| e.planned_count == 0) {
            return Err(EquityError::import(format!(
                "plan entry {}/{}/{} has a planned count of 0",
                bad.department, bad.level, bad.year
            )));
        }
        let plan = Self { entries };
        if plan.has_duplicate_keys() {
            return Err(EquityError::import("duplicate headcount plan key"));
        }
        Ok(plan)
    }

    fn has_duplicate_keys(&self) -> bool {
        self.entries.iter().enumerate().any(|(i, a)| {
            self.entries[i + 1..]
                .iter()
                .any(|b| b.same_key(&a.department, &a.level, a.year))
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
