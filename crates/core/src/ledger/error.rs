//! Ledger error types for entry model and validation errors.

use thiserror::Error;

use super::entry::EntryKind;
use super::validation::Violations;
use crate::workflow::types::EntryStatus;

/// A structural rule that an edit would break.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Constraint {
    /// The entry would have fewer lines than allowed.
    #[error("entry needs at least {minimum} lines, the change would leave {actual}")]
    MinimumLines {
        /// Minimum line count.
        minimum: usize,
        /// Line count after the change.
        actual: usize,
    },

    /// Payment details on a kind that does not carry them.
    #[error("payment details are not allowed on {kind} entries")]
    PaymentDetailsNotAllowed {
        /// The entry kind.
        kind: EntryKind,
    },
}

/// Errors that can occur while building or editing an entry.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// One or more ledger rules are violated.
    #[error("Entry is invalid: {0}")]
    Validation(Violations),

    /// The entry is not in a state that allows the operation.
    #[error("Cannot {operation} while entry is {status}")]
    InvalidState {
        /// The current status.
        status: EntryStatus,
        /// The attempted operation.
        operation: &'static str,
    },

    /// A structural constraint would be broken.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(Constraint),

    /// No line at the given index.
    #[error("Line {index} not found, entry has {count} lines")]
    LineNotFound {
        /// The requested index.
        index: usize,
        /// Number of lines in the entry.
        count: usize,
    },
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::ConstraintViolation(_) => "CONSTRAINT_VIOLATION",
            Self::LineNotFound { .. } => "LINE_NOT_FOUND",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::ConstraintViolation(_) => 400,
            Self::LineNotFound { .. } => 404,
            Self::InvalidState { .. } => 409,
        }
    }

    /// Returns the violations carried by a validation error.
    #[must_use]
    pub fn violations(&self) -> Option<&Violations> {
        match self {
            Self::Validation(violations) => Some(violations),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::ledger::validation::Violation;

    #[test]
    fn test_error_codes() {
        let err = LedgerError::InvalidState {
            status: EntryStatus::Posted,
            operation: "add line",
        };
        assert_eq!(err.error_code(), "INVALID_STATE");
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.to_string(), "Cannot add line while entry is posted");

        let err = LedgerError::ConstraintViolation(Constraint::MinimumLines {
            minimum: 2,
            actual: 1,
        });
        assert_eq!(err.error_code(), "CONSTRAINT_VIOLATION");
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_validation_error_display_includes_totals() {
        let err = LedgerError::Validation(Violations::from(vec![Violation::Unbalanced {
            debit: dec!(150.00),
            credit: dec!(140.00),
        }]));
        assert_eq!(
            err.to_string(),
            "Entry is invalid: entry is unbalanced: debit 150.00, credit 140.00, difference 10.00"
        );
        assert_eq!(err.violations().map(Violations::len), Some(1));
    }
}
