//! Workflow error types for entry lifecycle management.
//!
//! This module defines all error types that can occur during
//! workflow operations such as status transitions, postings and reversals.

use chrono::NaiveDate;
use ledgerline_shared::types::EntryId;
use thiserror::Error;

use crate::ledger::error::LedgerError;
use crate::ledger::validation::Violations;
use crate::workflow::types::{Action, EntryStatus};

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Attempted an action the current status does not allow.
    #[error("Cannot {action} an entry in status {from}")]
    IllegalTransition {
        /// The current status.
        from: EntryStatus,
        /// The attempted action.
        action: Action,
    },

    /// The balance validator rejected the entry.
    #[error("Entry is invalid: {0}")]
    Validation(Violations),

    /// Entry not found.
    #[error("Entry {0} not found")]
    EntryNotFound(EntryId),

    /// The entry already has a reversal.
    #[error("Entry {entry_id} is already reversed by {reversed_by}")]
    AlreadyReversed {
        /// The entry that was asked to be reversed.
        entry_id: EntryId,
        /// Its existing reversal.
        reversed_by: EntryId,
    },

    /// Reversals cannot themselves be reversed.
    #[error("Entry {0} is a reversal and cannot be reversed")]
    CannotReverseReversal(EntryId),

    /// The reversal date precedes the original entry date.
    #[error("Reversal dated {reversal_date} precedes the original entry date {original_date}")]
    BackdatedReversal {
        /// Date of the entry being reversed.
        original_date: NaiveDate,
        /// Requested reversal date.
        reversal_date: NaiveDate,
    },

    /// Rejection reason is required but not provided.
    #[error("Rejection reason is required")]
    RejectionReasonRequired,

    /// Cancellation reason is required but not provided.
    #[error("Cancellation reason is required")]
    CancellationReasonRequired,

    /// No acting identity is available.
    #[error("An acting user is required")]
    ActorRequired,

    /// Another caller changed the entry first.
    #[error("Entry {0} was modified concurrently, please retry")]
    ConcurrentModification(EntryId),

    /// Entry model error while editing a draft.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_)
            | Self::BackdatedReversal { .. }
            | Self::RejectionReasonRequired
            | Self::CancellationReasonRequired => 400,

            Self::ActorRequired => 401,

            Self::EntryNotFound(_) => 404,

            Self::IllegalTransition { .. }
            | Self::AlreadyReversed { .. }
            | Self::CannotReverseReversal(_)
            | Self::ConcurrentModification(_) => 409,

            Self::Ledger(err) => err.status_code(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::IllegalTransition { .. } => "ILLEGAL_TRANSITION",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::AlreadyReversed { .. } => "ALREADY_REVERSED",
            Self::CannotReverseReversal(_) => "CANNOT_REVERSE_REVERSAL",
            Self::BackdatedReversal { .. } => "BACKDATED_REVERSAL",
            Self::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
            Self::CancellationReasonRequired => "CANCELLATION_REASON_REQUIRED",
            Self::ActorRequired => "ACTOR_REQUIRED",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::Ledger(err) => err.error_code(),
        }
    }

    /// Returns true if retrying the same call may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification(_))
    }

    /// Returns the violations carried by a validation error.
    #[must_use]
    pub fn violations(&self) -> Option<&Violations> {
        match self {
            Self::Validation(violations) => Some(violations),
            Self::Ledger(err) => err.violations(),
            _ => None,
        }
    }
}
