//! Configuration for the equity ledger.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::levels::LevelStandardTable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityConfig {
    #[serde(default)]
    pub pool: PoolConfig,
    /// Level code to standard shares, seeded into a fresh ledger
    #[serde(default = "default_levels")]
    pub levels: BTreeMap<String, u64>,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl Default for EquityConfig {
    fn default() -> Self {
        Self {
            pool: PoolConfig::default(),
            levels: default_levels(),
            storage: StorageConfig::default(),
            general: GeneralConfig::default(),
        }
    }
}

impl EquityConfig {
    /// Load config from a TOML document.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    /// The configured level standards as a table.
    pub fn level_table(&self) -> LevelStandardTable {
        LevelStandardTable::from_pairs(self.levels.iter().map(|(l, s)| (l.clone(), *s)))
    }
}

/// Stock pool sizing and advisory thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Total shares in the pool
    #[serde(default = "default_total_capacity")]
    pub total_capacity: u64,
    /// Usage rate above which a warning is raised (0.0 - 1.0)
    #[serde(default = "default_warning_threshold")]
    pub warning_threshold: f64,
    /// Usage rate above which a critical warning is raised (0.0 - 1.0)
    #[serde(default = "default_critical_threshold")]
    pub critical_threshold: f64,
    /// Label attached to every new grant
    #[serde(default = "default_vesting_schedule")]
    pub vesting_schedule: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            total_capacity: default_total_capacity(),
            warning_threshold: default_warning_threshold(),
            critical_threshold: default_critical_threshold(),
            vesting_schedule: default_vesting_schedule(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON file holding the persisted state
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// Defaults
fn default_total_capacity() -> u64 { 5_000_000 }
fn default_warning_threshold() -> f64 { 0.8 }
fn default_critical_threshold() -> f64 { 0.9 }
fn default_vesting_schedule() -> String { "4-year, 1-year cliff".to_string() }
fn default_state_path() -> PathBuf { PathBuf::from("equity-state.json") }
fn default_log_level() -> String { "info".to_string() }
fn default_levels() -> BTreeMap<String, u64> {
    BTreeMap::from([
        ("P6".to_string(), 20_000),
        ("P7".to_string(), 40_000),
        ("P8".to_string(), 80_000),
    ])
}
