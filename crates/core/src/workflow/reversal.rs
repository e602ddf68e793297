//! Reversal generator for posted entries.
//!
//! A posted entry is never edited or cancelled. It is neutralised by a new
//! entry that copies every line with debit and credit swapped.

use chrono::NaiveDate;

use crate::ledger::entry::{Entry, EntryContent, Line, NewEntry};
use crate::workflow::error::WorkflowError;
use crate::workflow::policy::WorkflowPolicy;
use crate::workflow::types::{Action, EntryStatus};

/// Caller-supplied parameters for a reversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReversalRequest {
    /// Accounting date of the reversal.
    pub date: NaiveDate,
    /// Narration for the reversal. Defaults to "Reversal of <sequence number>".
    pub reason: Option<String>,
}

impl ReversalRequest {
    /// Creates a request with the default narration.
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self { date, reason: None }
    }

    /// Sets the narration.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Stateless service for deriving reversing entries.
pub struct ReversalService;

impl ReversalService {
    /// Check that `source` may be reversed on `date`.
    ///
    /// # Errors
    /// * `IllegalTransition` if the source is not posted
    /// * `CannotReverseReversal` if the source is itself a reversal
    /// * `AlreadyReversed` if the source already has a reversal
    /// * `BackdatedReversal` if `date` precedes the source date and the policy forbids it
    pub fn ensure_reversible(
        source: &Entry,
        date: NaiveDate,
        policy: &WorkflowPolicy,
    ) -> Result<(), WorkflowError> {
        if source.status() != EntryStatus::Posted {
            return Err(WorkflowError::IllegalTransition {
                from: source.status(),
                action: Action::Reverse,
            });
        }
        if source.reverses().is_some() {
            return Err(WorkflowError::CannotReverseReversal(source.id()));
        }
        if let Some(reversed_by) = source.reversed_by() {
            return Err(WorkflowError::AlreadyReversed {
                entry_id: source.id(),
                reversed_by,
            });
        }
        if date < source.entry_date() && !policy.allows_backdated_reversal() {
            return Err(WorkflowError::BackdatedReversal {
                original_date: source.entry_date(),
                reversal_date: date,
            });
        }
        Ok(())
    }

    /// Build the input for the entry that offsets `source`.
    ///
    /// Lines keep their account, description and order; only the sides swap.
    /// Kind, reference and payment details are carried over.
    ///
    /// # Errors
    /// Same as [`Self::ensure_reversible`].
    pub fn create_reversal(
        source: &Entry,
        request: &ReversalRequest,
        policy: &WorkflowPolicy,
    ) -> Result<NewEntry, WorkflowError> {
        Self::ensure_reversible(source, request.date, policy)?;

        let narration = request
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
            .map_or_else(
                || format!("Reversal of {}", source.sequence_number()),
                ToString::to_string,
            );

        Ok(NewEntry {
            kind: source.kind(),
            entry_date: Some(request.date),
            narration,
            reference: source.reference().map(ToString::to_string),
            payment: source.payment().cloned(),
            lines: source.lines().iter().map(Line::swapped).collect(),
        })
    }

    /// Returns true if `reversal` exactly offsets `source` line by line.
    #[must_use]
    pub fn offsets(source: &impl EntryContent, reversal: &impl EntryContent) -> bool {
        source.lines().len() == reversal.lines().len()
            && source
                .lines()
                .iter()
                .zip(reversal.lines())
                .all(|(original, mirrored)| {
                    original.account_code() == mirrored.account_code()
                        && original.debit() == mirrored.credit()
                        && original.credit() == mirrored.debit()
                })
    }
}
