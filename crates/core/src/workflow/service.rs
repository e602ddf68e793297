//! Workflow service for entry state transitions.
//!
//! This module implements the core state machine logic for moving entries
//! through the approval workflow. Every transition that commits money runs
//! the balance validator first and fails without touching the entry.

use chrono::Utc;
use ledgerline_shared::types::UserId;

use crate::ledger::account::AccountDirectory;
use crate::ledger::entry::Entry;
use crate::ledger::validation::validate_entry;
use crate::workflow::error::WorkflowError;
use crate::workflow::types::{Action, EntryStatus, WorkflowAction};

/// Stateless service for managing entry workflow transitions.
///
/// All methods are associated functions that validate a transition against
/// an entry snapshot and return the `WorkflowAction` to apply, with audit
/// trail information. Applying the action is the caller's job.
pub struct WorkflowService;

impl WorkflowService {
    /// Submit a draft entry for approval.
    ///
    /// # Errors
    /// * `IllegalTransition` if not in Draft status
    /// * `Validation` if the entry does not pass the balance validator
    pub fn submit(
        entry: &Entry,
        submitted_by: UserId,
        accounts: &dyn AccountDirectory,
    ) -> Result<WorkflowAction, WorkflowError> {
        Self::expect_status(entry, &[EntryStatus::Draft], Action::Submit)?;
        Self::validate(entry, accounts)?;

        Ok(WorkflowAction::Submit {
            new_status: EntryStatus::PendingApproval,
            submitted_by,
            submitted_at: Utc::now(),
        })
    }

    /// Approve a pending entry.
    ///
    /// With `auto_post` the entry moves straight to Posted in the same action.
    ///
    /// # Errors
    /// * `IllegalTransition` if not in PendingApproval status
    /// * `Validation` if the entry does not pass the balance validator
    pub fn approve(
        entry: &Entry,
        approved_by: UserId,
        accounts: &dyn AccountDirectory,
        auto_post: bool,
    ) -> Result<WorkflowAction, WorkflowError> {
        Self::expect_status(entry, &[EntryStatus::PendingApproval], Action::Approve)?;
        Self::validate(entry, accounts)?;

        Ok(WorkflowAction::Approve {
            new_status: if auto_post {
                EntryStatus::Posted
            } else {
                EntryStatus::Approved
            },
            approved_by,
            approved_at: Utc::now(),
        })
    }

    /// Reject a pending entry.
    ///
    /// # Errors
    /// * `IllegalTransition` if not in PendingApproval status
    /// * `RejectionReasonRequired` if reason is empty
    pub fn reject(
        entry: &Entry,
        rejected_by: UserId,
        rejection_reason: &str,
    ) -> Result<WorkflowAction, WorkflowError> {
        Self::expect_status(entry, &[EntryStatus::PendingApproval], Action::Reject)?;
        if rejection_reason.trim().is_empty() {
            return Err(WorkflowError::RejectionReasonRequired);
        }

        Ok(WorkflowAction::Reject {
            new_status: EntryStatus::Rejected,
            rejected_by,
            rejected_at: Utc::now(),
            rejection_reason: rejection_reason.trim().to_string(),
        })
    }

    /// Post an approved entry to the ledger.
    ///
    /// # Errors
    /// * `IllegalTransition` if not in Approved status
    /// * `Validation` if the entry does not pass the balance validator
    pub fn post(
        entry: &Entry,
        posted_by: UserId,
        accounts: &dyn AccountDirectory,
    ) -> Result<WorkflowAction, WorkflowError> {
        Self::expect_status(entry, &[EntryStatus::Approved], Action::Post)?;
        Self::validate(entry, accounts)?;

        Ok(Self::post_action(posted_by))
    }

    /// Post a freshly generated reversal straight from Draft.
    ///
    /// # Errors
    /// * `IllegalTransition` if the entry is not a draft reversal
    /// * `Validation` if the entry does not pass the balance validator
    pub fn post_reversal(
        entry: &Entry,
        posted_by: UserId,
        accounts: &dyn AccountDirectory,
    ) -> Result<WorkflowAction, WorkflowError> {
        if entry.status() != EntryStatus::Draft || entry.reverses().is_none() {
            return Err(WorkflowError::IllegalTransition {
                from: entry.status(),
                action: Action::Post,
            });
        }
        Self::validate(entry, accounts)?;

        Ok(Self::post_action(posted_by))
    }

    /// Cancel a draft or rejected entry.
    ///
    /// Posted entries are never cancelled; they can only be reversed.
    ///
    /// # Errors
    /// * `IllegalTransition` if not in Draft or Rejected status
    /// * `CancellationReasonRequired` if reason is empty
    pub fn cancel(
        entry: &Entry,
        cancelled_by: UserId,
        cancellation_reason: &str,
    ) -> Result<WorkflowAction, WorkflowError> {
        Self::expect_status(
            entry,
            &[EntryStatus::Draft, EntryStatus::Rejected],
            Action::Cancel,
        )?;
        if cancellation_reason.trim().is_empty() {
            return Err(WorkflowError::CancellationReasonRequired);
        }

        Ok(WorkflowAction::Cancel {
            new_status: EntryStatus::Cancelled,
            cancelled_by,
            cancelled_at: Utc::now(),
            cancellation_reason: cancellation_reason.trim().to_string(),
        })
    }

    /// Check that a draft may be deleted.
    ///
    /// # Errors
    /// * `IllegalTransition` if not in Draft status
    pub fn ensure_deletable(entry: &Entry) -> Result<(), WorkflowError> {
        Self::expect_status(entry, &[EntryStatus::Draft], Action::Delete)
    }

    /// Check if a status transition is valid.
    ///
    /// Valid transitions:
    /// - Draft → PendingApproval (submit)
    /// - Draft → Cancelled (cancel)
    /// - PendingApproval → Approved (approve)
    /// - PendingApproval → Posted (approve with auto-post)
    /// - PendingApproval → Rejected (reject)
    /// - Approved → Posted (post)
    /// - Rejected → Cancelled (cancel)
    #[must_use]
    pub fn is_valid_transition(from: EntryStatus, to: EntryStatus) -> bool {
        matches!(
            (from, to),
            (
                EntryStatus::Draft,
                EntryStatus::PendingApproval | EntryStatus::Cancelled
            ) | (
                EntryStatus::PendingApproval,
                EntryStatus::Approved | EntryStatus::Posted | EntryStatus::Rejected
            ) | (EntryStatus::Approved, EntryStatus::Posted)
                | (EntryStatus::Rejected, EntryStatus::Cancelled)
        )
    }

    fn post_action(posted_by: UserId) -> WorkflowAction {
        WorkflowAction::Post {
            new_status: EntryStatus::Posted,
            posted_by,
            posted_at: Utc::now(),
        }
    }

    fn expect_status(
        entry: &Entry,
        allowed: &[EntryStatus],
        action: Action,
    ) -> Result<(), WorkflowError> {
        if allowed.contains(&entry.status()) {
            Ok(())
        } else {
            Err(WorkflowError::IllegalTransition {
                from: entry.status(),
                action,
            })
        }
    }

    fn validate(entry: &Entry, accounts: &dyn AccountDirectory) -> Result<(), WorkflowError> {
        validate_entry(entry, accounts).map_err(WorkflowError::Validation)
    }
}
