//! Error types for equity-ledger.
//!
//! All of these are recoverable. Commands that fail leave the state exactly
//! as it was before the call.

use thiserror::Error;

/// Failure kinds surfaced by the command layer and snapshot import.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EquityError {
    /// A required field is missing, blank or out of range.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced employee, grant or level does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The entity is not in the state the operation requires.
    #[error("Invalid transition for {id}: {reason}")]
    InvalidTransition { id: String, reason: String },

    /// The requested issuance exceeds the current pool balance.
    #[error("Insufficient pool: requested {requested}, available {available}")]
    InsufficientPool { requested: u64, available: i64 },

    /// A snapshot is missing required keys or is internally inconsistent.
    #[error("Import format error: {0}")]
    ImportFormat(String),
}

impl EquityError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn invalid_transition(id: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidTransition {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn import(msg: impl Into<String>) -> Self {
        Self::ImportFormat(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, EquityError>;

/// Reject blank required text fields.
pub(crate) fn require_non_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EquityError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = EquityError::not_found("Employee", "E007");
        assert_eq!(err.to_string(), "Employee not found: E007");

        let err = EquityError::InsufficientPool {
            requested: 80_000,
            available: 1_000,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient pool: requested 80000, available 1000"
        );
    }

    #[test]
    fn test_require_non_blank() {
        assert!(require_non_blank("name", "Alice").is_ok());
        assert!(matches!(
            require_non_blank("name", "   "),
            Err(EquityError::Validation(_))
        ));
    }
}
