//! Property-based tests for ReversalService.

use chrono::{NaiveDate, Utc};
use ledgerline_shared::types::UserId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::ledger::account::{Account, AccountType, InMemoryAccountDirectory};
use crate::ledger::entry::{Entry, EntryKind, Line, NewEntry};
use crate::ledger::validation::validate_entry;
use crate::workflow::policy::WorkflowPolicy;
use crate::workflow::reversal::{ReversalRequest, ReversalService};
use crate::workflow::types::{EntryStatus, WorkflowAction};

const CODES: [&str; 3] = ["1000", "2100", "5100"];

fn accounts() -> InMemoryAccountDirectory {
    InMemoryAccountDirectory::new([
        Account::new("1000", "Cash", AccountType::Asset),
        Account::new("2100", "Accounts Payable", AccountType::Liability),
        Account::new("5100", "Freight", AccountType::Expense),
    ])
}

/// Strategy for generating random positive Decimal amounts.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for a balanced line set: credits offset by one closing debit.
fn arb_balanced_lines() -> impl Strategy<Value = Vec<Line>> {
    (
        prop::collection::vec((prop::sample::select(CODES.to_vec()), arb_amount()), 1..5),
        prop::sample::select(CODES.to_vec()),
    )
        .prop_map(|(credits, debit_code)| {
            let total: Decimal = credits.iter().map(|(_, amount)| *amount).sum();
            let mut lines = vec![Line::new_debit(debit_code, total)];
            lines.extend(
                credits
                    .into_iter()
                    .map(|(code, amount)| Line::new_credit(code, amount)),
            );
            lines
        })
}

fn arb_kind() -> impl Strategy<Value = EntryKind> {
    prop::sample::select(EntryKind::ALL.to_vec())
}

fn posted(kind: EntryKind, lines: Vec<Line>) -> Entry {
    let input = NewEntry::new(
        kind,
        NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
        "Generated",
        lines,
    );
    let mut entry = Entry::create(input, "JV-000042".to_string(), UserId::new()).unwrap();
    entry.apply(&WorkflowAction::Post {
        new_status: EntryStatus::Posted,
        posted_by: UserId::new(),
        posted_at: Utc::now(),
    });
    entry
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every source line reappears at the same position with the same amount on the other side.
    #[test]
    fn prop_reversal_mirrors_every_line(
        kind in arb_kind(),
        lines in arb_balanced_lines(),
        days_later in 0u64..90,
    ) {
        let source = posted(kind, lines);
        let date = source.entry_date() + chrono::Days::new(days_later);
        let reversal = ReversalService::create_reversal(
            &source,
            &ReversalRequest::new(date),
            &WorkflowPolicy::default(),
        ).unwrap();

        prop_assert_eq!(reversal.lines.len(), source.lines().len());
        for (original, mirrored) in source.lines().iter().zip(&reversal.lines) {
            prop_assert_eq!(original.account_code(), mirrored.account_code());
            prop_assert_eq!(original.debit(), mirrored.credit());
            prop_assert_eq!(original.credit(), mirrored.debit());
        }
        prop_assert!(ReversalService::offsets(&source, &reversal));
        prop_assert_eq!(reversal.kind, kind);
    }

    /// The reversal of a balanced entry passes the same validator.
    #[test]
    fn prop_reversal_is_balanced(lines in arb_balanced_lines()) {
        let source = posted(EntryKind::Journal, lines);
        let reversal = ReversalService::create_reversal(
            &source,
            &ReversalRequest::new(source.entry_date()),
            &WorkflowPolicy::default(),
        ).unwrap();

        prop_assert!(validate_entry(&reversal, &accounts()).is_ok());
        prop_assert_eq!(
            crate::ledger::entry::EntryContent::total_debit(&reversal),
            source.total_credit()
        );
    }

    /// Dates before the source are refused unless the policy allows them.
    #[test]
    fn prop_backdated_reversal_rejected(
        lines in arb_balanced_lines(),
        days_earlier in 1u64..365,
    ) {
        let source = posted(EntryKind::Journal, lines);
        let date = source.entry_date() - chrono::Days::new(days_earlier);
        let request = ReversalRequest::new(date);

        prop_assert!(ReversalService::create_reversal(&source, &request, &WorkflowPolicy::default()).is_err());
        let lenient = WorkflowPolicy::default().with_backdated_reversals(true);
        prop_assert!(ReversalService::create_reversal(&source, &request, &lenient).is_ok());
    }
}
