//! Equity incentive bookkeeping: stock pool, grants and employee lifecycle.
//!
//! Five structures make up the state:
//!
//! - **Level standards**: annual standard share grant per job level
//! - **Headcount plan**: planned hires per department, level and year
//! - **Employee registry**: employees and their lifecycle status
//! - **Grant ledger**: shares granted to employees, with vesting progress
//! - **Stock pool**: remaining balance plus an append-only transaction log
//!
//! # Lifecycle
//!
//! ```text
//!   add(PendingHire) ──► PendingHire ──process_hire──► Active ──process_departure──► Departed
//!   add(Active) ─────────────────────────────────────► Active
//!                                                        │  ▲
//!                                                        └──┘ process_promotion
//! ```
//!
//! Entering `Active` issues the level's standard grant and debits the pool.
//! Departure terminates active grants and credits the unvested remainder
//! back. A promotion to a higher standard issues the difference.
//!
//! # Example
//!
//! ```
//! use equity_ledger::{EquityAdmin, EquityConfig, EmployeeStatus};
//!
//! let mut admin = EquityAdmin::new(&EquityConfig::default()).unwrap();
//! let hired = admin
//!     .add_employee("Alice", "Engineering", "P7", EmployeeStatus::Active)
//!     .unwrap();
//! assert_eq!(hired.grant.unwrap().shares, 40_000);
//! assert_eq!(admin.pool().balance(), 5_000_000 - 40_000);
//! ```

pub mod admin;
pub mod config;
pub mod error;
pub mod grants;
pub mod levels;
pub mod plan;
pub mod pool;
pub mod registry;
pub mod report;
pub mod shared;
pub mod snapshot;
pub mod store;
pub mod types;

// Re-export main types
pub use admin::{
    Advisory, DepartureOutcome, EntryOutcome, EquityAdmin, GrantIssued, LedgerSettings,
    PlanOutcome, PlanUpsertKind, PoolInitialized, PromotionOutcome,
};
pub use config::EquityConfig;
pub use error::{EquityError, Result};
pub use report::{Report, UsageLevel};
pub use shared::SharedLedger;
pub use snapshot::Snapshot;
pub use store::{JsonFileStore, MemoryStore, SnapshotStore, StoreError};
pub use types::*;
