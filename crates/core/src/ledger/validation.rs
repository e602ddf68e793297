//! Balance validator.
//!
//! [`validate_entry`] gates every transition that commits money: submit,
//! approve, post, reversal and each batch import group. It never fails
//! fast; every violation is collected so a caller can show all of them.

use std::collections::HashSet;
use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use super::account::AccountDirectory;
use super::entry::{EntryContent, MIN_LINES};

/// A single broken ledger rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Violation {
    /// The entry has no accounting date.
    MissingDate,
    /// The narration is empty.
    MissingNarration,
    /// Fewer than two lines.
    InsufficientLines {
        /// Number of lines found.
        count: usize,
    },
    /// A line carries neither a debit nor a credit.
    ZeroAmountLine {
        /// 1-based line number.
        line: usize,
    },
    /// A line carries a negative amount.
    NegativeAmountLine {
        /// 1-based line number.
        line: usize,
    },
    /// A line has an empty account reference.
    MissingAccount {
        /// 1-based line number.
        line: usize,
    },
    /// An account code does not resolve in the account directory.
    UnknownAccount {
        /// The unresolved code.
        code: String,
    },
    /// Debits and credits differ.
    Unbalanced {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },
    /// Total debit is zero.
    ZeroTotal,
}

impl Violation {
    /// Returns the violation code for API responses.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingDate => "MISSING_DATE",
            Self::MissingNarration => "MISSING_NARRATION",
            Self::InsufficientLines { .. } => "INSUFFICIENT_LINES",
            Self::ZeroAmountLine { .. } => "ZERO_AMOUNT_LINE",
            Self::NegativeAmountLine { .. } => "NEGATIVE_AMOUNT_LINE",
            Self::MissingAccount { .. } => "MISSING_ACCOUNT",
            Self::UnknownAccount { .. } => "UNKNOWN_ACCOUNT",
            Self::Unbalanced { .. } => "UNBALANCED",
            Self::ZeroTotal => "ZERO_TOTAL",
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDate => f.write_str("entry date is missing"),
            Self::MissingNarration => f.write_str("narration is missing"),
            Self::InsufficientLines { count } => {
                write!(f, "entry needs at least {MIN_LINES} lines, found {count}")
            }
            Self::ZeroAmountLine { line } => write!(f, "line {line} has no amount"),
            Self::NegativeAmountLine { line } => write!(f, "line {line} has a negative amount"),
            Self::MissingAccount { line } => write!(f, "line {line} has no account"),
            Self::UnknownAccount { code } => write!(f, "account {code} not found"),
            Self::Unbalanced { debit, credit } => write!(
                f,
                "entry is unbalanced: debit {debit}, credit {credit}, difference {}",
                debit - credit
            ),
            Self::ZeroTotal => f.write_str("entry total must be greater than zero"),
        }
    }
}

/// Every violation found on one entry, in check order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Violations(Vec<Violation>);

impl Violations {
    /// Returns the violations as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Violation] {
        &self.0
    }

    /// Number of violations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if nothing was violated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Human-readable message per violation.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }

    /// Returns the inner list.
    #[must_use]
    pub fn into_inner(self) -> Vec<Violation> {
        self.0
    }
}

impl From<Vec<Violation>> for Violations {
    fn from(violations: Vec<Violation>) -> Self {
        Self(violations)
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join("; "))
    }
}

/// Validates an entry against the ledger rules.
///
/// Checks, in order:
/// 1. date present and narration non-empty
/// 2. at least two lines, each with a positive amount
/// 3. every account reference resolves
/// 4. total debit equals total credit (exact)
/// 5. total debit is greater than zero
///
/// # Errors
///
/// Returns every violation found.
pub fn validate_entry<E>(entry: &E, accounts: &dyn AccountDirectory) -> Result<(), Violations>
where
    E: EntryContent + ?Sized,
{
    let mut violations = Vec::new();

    if entry.date().is_none() {
        violations.push(Violation::MissingDate);
    }
    if entry.narration().trim().is_empty() {
        violations.push(Violation::MissingNarration);
    }

    let lines = entry.lines();
    if lines.len() < MIN_LINES {
        violations.push(Violation::InsufficientLines { count: lines.len() });
    }
    for (i, line) in lines.iter().enumerate() {
        if line.debit() < Decimal::ZERO || line.credit() < Decimal::ZERO {
            violations.push(Violation::NegativeAmountLine { line: i + 1 });
        } else if line.amount().is_zero() {
            violations.push(Violation::ZeroAmountLine { line: i + 1 });
        }
    }

    let mut seen = HashSet::new();
    for (i, line) in lines.iter().enumerate() {
        let code = line.account_code().trim();
        if code.is_empty() {
            violations.push(Violation::MissingAccount { line: i + 1 });
        } else if accounts.resolve_account(code).is_none() && seen.insert(code) {
            violations.push(Violation::UnknownAccount {
                code: code.to_string(),
            });
        }
    }

    let debit = entry.total_debit();
    let credit = entry.total_credit();
    if debit != credit {
        violations.push(Violation::Unbalanced { debit, credit });
    }
    if debit <= Decimal::ZERO {
        violations.push(Violation::ZeroTotal);
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(Violations(violations))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::ledger::account::{Account, AccountType, InMemoryAccountDirectory};
    use crate::ledger::entry::{EntryKind, Line, NewEntry};

    fn accounts() -> InMemoryAccountDirectory {
        InMemoryAccountDirectory::new([
            Account::new("1000", "Cash", AccountType::Asset),
            Account::new("2100", "Accounts Payable", AccountType::Liability),
            Account::new("4100", "Rent Expense", AccountType::Expense),
        ])
    }

    fn entry(lines: Vec<Line>) -> NewEntry {
        NewEntry::new(
            EntryKind::Journal,
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            "Office rent",
            lines,
        )
    }

    #[test]
    fn test_balanced_entry_passes() {
        let input = entry(vec![
            Line::new_debit("4100", dec!(50000)),
            Line::new_credit("2100", dec!(50000)),
        ]);
        assert!(validate_entry(&input, &accounts()).is_ok());
    }

    #[test]
    fn test_unbalanced_reports_single_violation_with_difference() {
        let input = entry(vec![
            Line::new_debit("4100", dec!(100)),
            Line::new_debit("1000", dec!(50)),
            Line::new_credit("2100", dec!(140)),
        ]);
        let violations = validate_entry(&input, &accounts()).unwrap_err();
        assert_eq!(
            violations.as_slice(),
            &[Violation::Unbalanced {
                debit: dec!(150),
                credit: dec!(140)
            }]
        );
        assert_eq!(
            violations.to_string(),
            "entry is unbalanced: debit 150, credit 140, difference 10"
        );
    }

    #[test]
    fn test_accumulates_all_violations_in_order() {
        let mut input = entry(vec![Line::new_debit("9999", Decimal::ZERO)]);
        input.entry_date = None;
        input.narration = String::new();

        let violations = validate_entry(&input, &accounts()).unwrap_err();
        assert_eq!(
            violations.as_slice(),
            &[
                Violation::MissingDate,
                Violation::MissingNarration,
                Violation::InsufficientLines { count: 1 },
                Violation::ZeroAmountLine { line: 1 },
                Violation::UnknownAccount {
                    code: "9999".to_string()
                },
                Violation::ZeroTotal,
            ]
        );
    }

    #[test]
    fn test_unknown_account_reported_once() {
        let input = entry(vec![
            Line::new_debit("9999", dec!(10)),
            Line::new_credit("9999", dec!(10)),
        ]);
        let violations = validate_entry(&input, &accounts()).unwrap_err();
        assert_eq!(violations.messages(), vec!["account 9999 not found"]);
    }

    #[test]
    fn test_negative_amount_rejected() {
        let input = entry(vec![
            Line::new_debit("4100", dec!(-10)),
            Line::new_credit("2100", dec!(-10)),
        ]);
        let violations = validate_entry(&input, &accounts()).unwrap_err();
        assert_eq!(
            violations.as_slice(),
            &[
                Violation::NegativeAmountLine { line: 1 },
                Violation::NegativeAmountLine { line: 2 },
                Violation::ZeroTotal,
            ]
        );
    }

    #[rstest]
    #[case(Violation::MissingDate, "MISSING_DATE", "entry date is missing")]
    #[case(Violation::ZeroTotal, "ZERO_TOTAL", "entry total must be greater than zero")]
    #[case(
        Violation::InsufficientLines { count: 1 },
        "INSUFFICIENT_LINES",
        "entry needs at least 2 lines, found 1"
    )]
    #[case(Violation::MissingAccount { line: 3 }, "MISSING_ACCOUNT", "line 3 has no account")]
    fn test_violation_code_and_message(
        #[case] violation: Violation,
        #[case] code: &str,
        #[case] message: &str,
    ) {
        assert_eq!(violation.code(), code);
        assert_eq!(violation.to_string(), message);
    }
}
