//! Property-based tests for WorkflowService.

use chrono::{NaiveDate, Utc};
use ledgerline_shared::types::UserId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::ledger::account::{Account, AccountType, InMemoryAccountDirectory};
use crate::ledger::entry::{Entry, EntryKind, Line, NewEntry};
use crate::workflow::error::WorkflowError;
use crate::workflow::service::WorkflowService;
use crate::workflow::types::{EntryStatus, WorkflowAction};

fn accounts() -> InMemoryAccountDirectory {
    InMemoryAccountDirectory::new([
        Account::new("1000", "Cash", AccountType::Asset),
        Account::new("4000", "Sales", AccountType::Income),
    ])
}

/// Strategy for generating random EntryStatus values.
fn arb_status() -> impl Strategy<Value = EntryStatus> {
    prop_oneof![
        Just(EntryStatus::Draft),
        Just(EntryStatus::PendingApproval),
        Just(EntryStatus::Approved),
        Just(EntryStatus::Posted),
        Just(EntryStatus::Rejected),
        Just(EntryStatus::Cancelled),
    ]
}

fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for whitespace-only reasons.
fn arb_blank_reason() -> impl Strategy<Value = String> {
    "[ \t]{0,8}"
}

/// Builds a balanced entry and drives it to `status`.
fn entry_in(status: EntryStatus, amount: Decimal) -> Entry {
    let input = NewEntry::new(
        EntryKind::Receipt,
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        "Cash sale",
        vec![
            Line::new_debit("1000", amount),
            Line::new_credit("4000", amount),
        ],
    );
    let mut entry = Entry::create(input, "RV-000001".to_string(), UserId::new()).unwrap();
    let user = UserId::new();
    let now = Utc::now();

    let path = match status {
        EntryStatus::Draft => vec![],
        EntryStatus::PendingApproval => vec![submit(user)],
        EntryStatus::Approved => vec![submit(user), approve(user, EntryStatus::Approved)],
        EntryStatus::Posted => vec![submit(user), approve(user, EntryStatus::Posted)],
        EntryStatus::Rejected => vec![
            submit(user),
            WorkflowAction::Reject {
                new_status: EntryStatus::Rejected,
                rejected_by: user,
                rejected_at: now,
                rejection_reason: "No voucher".to_string(),
            },
        ],
        EntryStatus::Cancelled => vec![WorkflowAction::Cancel {
            new_status: EntryStatus::Cancelled,
            cancelled_by: user,
            cancelled_at: now,
            cancellation_reason: "Duplicate".to_string(),
        }],
    };
    for action in &path {
        entry.apply(action);
    }
    entry
}

fn submit(user: UserId) -> WorkflowAction {
    WorkflowAction::Submit {
        new_status: EntryStatus::PendingApproval,
        submitted_by: user,
        submitted_at: Utc::now(),
    }
}

fn approve(user: UserId, new_status: EntryStatus) -> WorkflowAction {
    WorkflowAction::Approve {
        new_status,
        approved_by: user,
        approved_at: Utc::now(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every action the service hands out is a valid transition from the current status.
    #[test]
    fn prop_service_only_emits_valid_transitions(
        status in arb_status(),
        amount in arb_amount(),
        auto_post in any::<bool>(),
    ) {
        let entry = entry_in(status, amount);
        prop_assert_eq!(entry.status(), status);
        let user = UserId::new();
        let directory = accounts();

        let attempts = [
            WorkflowService::submit(&entry, user, &directory),
            WorkflowService::approve(&entry, user, &directory, auto_post),
            WorkflowService::reject(&entry, user, "Incorrect amount"),
            WorkflowService::post(&entry, user, &directory),
            WorkflowService::cancel(&entry, user, "Raised twice"),
        ];
        for attempt in attempts {
            match attempt {
                Ok(action) => prop_assert!(
                    WorkflowService::is_valid_transition(status, action.new_status()),
                    "{:?} -> {:?}", status, action.new_status()
                ),
                Err(err) => {
                    let is_illegal = matches!(err, WorkflowError::IllegalTransition { from, .. } if from == status);
                    prop_assert!(is_illegal, "unexpected error {:?}", err);
                }
            }
        }
    }

    /// Terminal statuses accept no action at all.
    #[test]
    fn prop_terminal_statuses_are_final(amount in arb_amount()) {
        let user = UserId::new();
        let directory = accounts();
        for status in [EntryStatus::Posted, EntryStatus::Cancelled] {
            let entry = entry_in(status, amount);
            prop_assert!(WorkflowService::submit(&entry, user, &directory).is_err());
            prop_assert!(WorkflowService::approve(&entry, user, &directory, true).is_err());
            prop_assert!(WorkflowService::reject(&entry, user, "late").is_err());
            prop_assert!(WorkflowService::post(&entry, user, &directory).is_err());
            prop_assert!(WorkflowService::cancel(&entry, user, "late").is_err());
        }
    }

    /// Blank reasons never reject or cancel.
    #[test]
    fn prop_blank_reasons_are_refused(
        amount in arb_amount(),
        reason in arb_blank_reason(),
    ) {
        let user = UserId::new();
        let pending = entry_in(EntryStatus::PendingApproval, amount);
        prop_assert!(matches!(
            WorkflowService::reject(&pending, user, &reason),
            Err(WorkflowError::RejectionReasonRequired)
        ));

        let draft = entry_in(EntryStatus::Draft, amount);
        prop_assert!(matches!(
            WorkflowService::cancel(&draft, user, &reason),
            Err(WorkflowError::CancellationReasonRequired)
        ));
    }

    /// An unbalanced draft is never submitted.
    #[test]
    fn prop_unbalanced_draft_never_submits(
        amount in arb_amount(),
        delta in arb_amount(),
    ) {
        let mut entry = entry_in(EntryStatus::Draft, amount);
        entry
            .update_line(0, crate::ledger::entry::LineUpdate::Debit(amount + delta))
            .unwrap();

        let result = WorkflowService::submit(&entry, UserId::new(), &accounts());
        prop_assert!(matches!(result, Err(WorkflowError::Validation(_))));
        prop_assert_eq!(entry.status(), EntryStatus::Draft);
    }
}
