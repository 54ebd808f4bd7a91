//! Level standard table: level code to annual standard share grant.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{require_non_blank, EquityError, Result};
use crate::types::LevelStandard;

/// Mutable map of level code to standard shares.
///
/// Changing a standard never touches grants that were already issued.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelStandardTable {
    standards: BTreeMap<String, u64>,
}

impl LevelStandardTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(level, shares)` pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        Self {
            standards: pairs.into_iter().map(|(l, s)| (l.into(), s)).collect(),
        }
    }

    /// Insert or overwrite a standard. Returns the previous value.
    pub fn set(&mut self, level: &str, shares: u64) -> Result<Option<u64>> {
        require_non_blank("level", level)?;
        Ok(self.standards.insert(level.trim().to_string(), shares))
    }

    /// Standard shares for a level; unknown levels are 0.
    pub fn get(&self, level: &str) -> u64 {
        self.standards.get(level).copied().unwrap_or(0)
    }

    pub fn contains(&self, level: &str) -> bool {
        self.standards.contains_key(level)
    }

    /// Remove a standard, returning the removed share count.
    pub fn delete(&mut self, level: &str) -> Result<u64> {
        self.standards
            .remove(level)
            .ok_or_else(|| EquityError::not_found("Level", level))
    }

    /// Ordered snapshot (by level code).
    pub fn list(&self) -> Vec<LevelStandard> {
        self.standards
            .iter()
            .map(|(level, shares)| LevelStandard {
                level: level.clone(),
                shares: *shares,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.standards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.standards.is_empty()
    }
}
