//! Workflow domain types for entry lifecycle management.
//!
//! This module defines the core types used for managing entry
//! status transitions and workflow actions.

use std::fmt;

use chrono::{DateTime, Utc};
use ledgerline_shared::types::UserId;
use serde::{Deserialize, Serialize};

/// Entry status in the approval workflow.
///
/// The valid transitions are:
/// - Draft → PendingApproval (submit)
/// - PendingApproval → Approved, or Posted for auto-posting kinds (approve)
/// - PendingApproval → Rejected (reject)
/// - Approved → Posted (post)
/// - Draft, Rejected → Cancelled (cancel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    /// Entry is being drafted and can be modified.
    Draft,
    /// Entry has been submitted for approval.
    PendingApproval,
    /// Entry has been approved and is ready for posting.
    Approved,
    /// Entry has been posted to the ledger (immutable).
    Posted,
    /// Entry was rejected by an approver (terminal).
    Rejected,
    /// Entry was cancelled before posting (immutable).
    Cancelled,
}

impl EntryStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingApproval => "pending_approval",
            Self::Approved => "approved",
            Self::Posted => "posted",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "pending_approval" | "pending" => Some(Self::PendingApproval),
            "approved" => Some(Self::Approved),
            "posted" => Some(Self::Posted),
            "rejected" => Some(Self::Rejected),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if the entry can be modified.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if the entry is immutable.
    #[must_use]
    pub fn is_immutable(&self) -> bool {
        matches!(self, Self::Posted | Self::Cancelled)
    }

    /// Returns true if no further lifecycle transition applies to the entry itself.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Posted | Self::Rejected | Self::Cancelled)
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An action a caller may attempt on an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Edit a draft's header or lines.
    Edit,
    /// Submit a draft for approval.
    Submit,
    /// Approve a pending entry.
    Approve,
    /// Reject a pending entry.
    Reject,
    /// Post an approved entry.
    Post,
    /// Cancel an unposted entry.
    Cancel,
    /// Delete a draft.
    Delete,
    /// Reverse a posted entry.
    Reverse,
}

impl Action {
    /// Returns the string representation of the action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Submit => "submit",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Post => "post",
            Self::Cancel => "cancel",
            Self::Delete => "delete",
            Self::Reverse => "reverse",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow action representing a state transition with audit data.
///
/// Each variant captures the action performed, the resulting status,
/// and the audit trail information (who, when, why).
#[derive(Debug, Clone)]
pub enum WorkflowAction {
    /// Submit a draft entry for approval.
    Submit {
        /// The new status after submission.
        new_status: EntryStatus,
        /// The user who submitted the entry.
        submitted_by: UserId,
        /// When the entry was submitted.
        submitted_at: DateTime<Utc>,
    },
    /// Approve a pending entry.
    Approve {
        /// Approved, or Posted when the kind auto-posts.
        new_status: EntryStatus,
        /// The user who approved the entry.
        approved_by: UserId,
        /// When the entry was approved.
        approved_at: DateTime<Utc>,
    },
    /// Reject a pending entry.
    Reject {
        /// The new status after rejection.
        new_status: EntryStatus,
        /// The user who rejected the entry.
        rejected_by: UserId,
        /// When the entry was rejected.
        rejected_at: DateTime<Utc>,
        /// The reason for rejection.
        rejection_reason: String,
    },
    /// Post an entry to the ledger.
    Post {
        /// The new status after posting.
        new_status: EntryStatus,
        /// The user who posted the entry.
        posted_by: UserId,
        /// When the entry was posted.
        posted_at: DateTime<Utc>,
    },
    /// Cancel an unposted entry.
    Cancel {
        /// The new status after cancellation.
        new_status: EntryStatus,
        /// The user who cancelled the entry.
        cancelled_by: UserId,
        /// When the entry was cancelled.
        cancelled_at: DateTime<Utc>,
        /// The reason for cancellation.
        cancellation_reason: String,
    },
}

impl WorkflowAction {
    /// Returns the new status resulting from this action.
    #[must_use]
    pub fn new_status(&self) -> EntryStatus {
        match self {
            Self::Submit { new_status, .. }
            | Self::Approve { new_status, .. }
            | Self::Reject { new_status, .. }
            | Self::Post { new_status, .. }
            | Self::Cancel { new_status, .. } => *new_status,
        }
    }

    /// Returns true if applying this action posts the entry to the ledger.
    #[must_use]
    pub fn posts(&self) -> bool {
        self.new_status() == EntryStatus::Posted
    }

    /// Returns when the action happened.
    #[must_use]
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            Self::Submit { submitted_at, .. } => *submitted_at,
            Self::Approve { approved_at, .. } => *approved_at,
            Self::Reject { rejected_at, .. } => *rejected_at,
            Self::Post { posted_at, .. } => *posted_at,
            Self::Cancel { cancelled_at, .. } => *cancelled_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(EntryStatus::Draft.as_str(), "draft");
        assert_eq!(EntryStatus::PendingApproval.as_str(), "pending_approval");
        assert_eq!(EntryStatus::Approved.as_str(), "approved");
        assert_eq!(EntryStatus::Posted.as_str(), "posted");
        assert_eq!(EntryStatus::Rejected.as_str(), "rejected");
        assert_eq!(EntryStatus::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(EntryStatus::parse("draft"), Some(EntryStatus::Draft));
        assert_eq!(
            EntryStatus::parse("PENDING_APPROVAL"),
            Some(EntryStatus::PendingApproval)
        );
        assert_eq!(EntryStatus::parse("Canceled"), Some(EntryStatus::Cancelled));
        assert_eq!(EntryStatus::parse("voided"), None);
    }

    #[test]
    fn test_status_serde_uses_screaming_case() {
        assert_eq!(
            serde_json::to_string(&EntryStatus::PendingApproval).unwrap(),
            "\"PENDING_APPROVAL\""
        );
    }

    #[test]
    fn test_status_editable() {
        assert!(EntryStatus::Draft.is_editable());
        assert!(!EntryStatus::PendingApproval.is_editable());
        assert!(!EntryStatus::Approved.is_editable());
        assert!(!EntryStatus::Posted.is_editable());
        assert!(!EntryStatus::Rejected.is_editable());
        assert!(!EntryStatus::Cancelled.is_editable());
    }

    #[test]
    fn test_status_immutable() {
        assert!(!EntryStatus::Draft.is_immutable());
        assert!(!EntryStatus::Rejected.is_immutable());
        assert!(EntryStatus::Posted.is_immutable());
        assert!(EntryStatus::Cancelled.is_immutable());
    }

    #[test]
    fn test_action_display() {
        assert_eq!(Action::Reverse.to_string(), "reverse");
        assert_eq!(format!("{}", Action::Submit), "submit");
    }
}
