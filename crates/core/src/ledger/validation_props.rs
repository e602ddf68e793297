//! Property-based tests for the balance validator and line invariants.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::account::{Account, AccountType, InMemoryAccountDirectory};
use super::entry::{EntryKind, Line, LineUpdate, NewEntry};
use super::validation::{validate_entry, Violation};

const CODES: [&str; 4] = ["1000", "2100", "4000", "4100"];

fn accounts() -> InMemoryAccountDirectory {
    InMemoryAccountDirectory::new([
        Account::new("1000", "Cash", AccountType::Asset),
        Account::new("2100", "Accounts Payable", AccountType::Liability),
        Account::new("4000", "Sales", AccountType::Income),
        Account::new("4100", "Rent Expense", AccountType::Expense),
    ])
}

/// Strategy to generate a valid positive amount (> 0).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn account_code() -> impl Strategy<Value = &'static str> {
    prop::sample::select(CODES.to_vec())
}

/// Strategy for a balanced entry: N debit lines and one closing credit line.
fn balanced_lines() -> impl Strategy<Value = Vec<Line>> {
    (
        prop::collection::vec((account_code(), positive_amount()), 1..6),
        account_code(),
    )
        .prop_map(|(debits, credit_code)| {
            let total: Decimal = debits.iter().map(|(_, amount)| *amount).sum();
            let mut lines: Vec<Line> = debits
                .into_iter()
                .map(|(code, amount)| Line::new_debit(code, amount))
                .collect();
            lines.push(Line::new_credit(credit_code, total));
            lines
        })
}

fn entry(lines: Vec<Line>) -> NewEntry {
    NewEntry::new(
        EntryKind::Journal,
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        "Generated entry",
        lines,
    )
}

fn line_update() -> impl Strategy<Value = LineUpdate> {
    prop_oneof![
        (0i64..10_000).prop_map(|n| LineUpdate::Debit(Decimal::new(n, 2))),
        (0i64..10_000).prop_map(|n| LineUpdate::Credit(Decimal::new(n, 2))),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any balanced entry with resolvable accounts passes.
    #[test]
    fn prop_balanced_entries_pass(lines in balanced_lines()) {
        let input = entry(lines);
        prop_assert!(validate_entry(&input, &accounts()).is_ok());
    }

    /// Shifting one line by a delta yields exactly one unbalanced violation carrying that delta.
    #[test]
    fn prop_unbalanced_reports_exact_delta(
        lines in balanced_lines(),
        delta in positive_amount(),
    ) {
        let mut lines = lines;
        let first = lines[0].debit() + delta;
        lines[0].set_debit(first);
        let input = entry(lines);

        let violations = validate_entry(&input, &accounts()).unwrap_err();
        prop_assert_eq!(violations.len(), 1);
        match &violations.as_slice()[0] {
            Violation::Unbalanced { debit, credit } => prop_assert_eq!(*debit - *credit, delta),
            other => prop_assert!(false, "unexpected violation {:?}", other),
        }
    }

    /// Validating the same unmutated entry twice gives identical results.
    #[test]
    fn prop_revalidation_is_idempotent(
        lines in balanced_lines(),
        delta in 0i64..1_000,
    ) {
        let mut lines = lines;
        let last = lines.len() - 1;
        let credit = lines[last].credit() + Decimal::new(delta, 2);
        lines[last].set_credit(credit);
        let input = entry(lines);

        let first = validate_entry(&input, &accounts());
        let second = validate_entry(&input, &accounts());
        prop_assert_eq!(first, second);
    }

    /// No sequence of line updates leaves both sides non-zero.
    #[test]
    fn prop_line_never_has_both_sides(
        updates in prop::collection::vec(line_update(), 1..20),
    ) {
        let mut line = Line::new_debit("1000", Decimal::ONE);
        for update in updates {
            match update {
                LineUpdate::Debit(amount) => line.set_debit(amount),
                LineUpdate::Credit(amount) => line.set_credit(amount),
                _ => unreachable!(),
            }
            prop_assert!(line.debit().is_zero() || line.credit().is_zero());
        }
    }
}
