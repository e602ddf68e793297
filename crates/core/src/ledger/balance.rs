//! Account balance calculations.
//!
//! Balances are never stored. Posting appends one [`Posting`] per entry line
//! to a single-writer [`PostingJournal`], and every balance is folded from
//! that journal on read, so concurrent postings against the same account
//! cannot lose an update.

use std::sync::RwLock;

use chrono::{DateTime, NaiveDate, Utc};
use ledgerline_shared::types::EntryId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::entry::Entry;

/// The side on which an account normally carries its balance.
///
/// - Asset/Expense: balance = debit - credit (debit-normal)
/// - Liability/Equity/Income: balance = credit - debit (credit-normal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalBalance {
    /// Debit-normal accounts (Asset, Expense).
    Debit,
    /// Credit-normal accounts (Liability, Equity, Income).
    Credit,
}

impl NormalBalance {
    /// Calculates the balance change for a debit/credit pair.
    #[must_use]
    pub fn balance_change(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }
}

/// One posted line in the journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Posting {
    /// Position in the journal, starting at 1.
    pub journal_sequence: u64,
    /// The posted entry.
    pub entry_id: EntryId,
    /// Code of the affected account.
    pub account_code: String,
    /// Debit amount (0 if credit).
    pub debit: Decimal,
    /// Credit amount (0 if debit).
    pub credit: Decimal,
    /// Accounting date of the entry.
    pub entry_date: NaiveDate,
    /// When the entry was posted.
    pub posted_at: DateTime<Utc>,
}

/// Account balance derived from the posting journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The account code.
    pub account_code: String,
    /// Total debit amount.
    pub debit_total: Decimal,
    /// Total credit amount.
    pub credit_total: Decimal,
    /// Net balance on the account's normal side.
    pub balance: Decimal,
    /// Number of postings folded into this balance.
    pub postings: usize,
}

impl AccountBalance {
    /// Creates an empty balance for an account.
    #[must_use]
    pub fn new(account_code: impl Into<String>) -> Self {
        Self {
            account_code: account_code.into(),
            debit_total: Decimal::ZERO,
            credit_total: Decimal::ZERO,
            balance: Decimal::ZERO,
            postings: 0,
        }
    }

    fn apply(&mut self, posting: &Posting, normal: NormalBalance) {
        self.debit_total += posting.debit;
        self.credit_total += posting.credit;
        self.balance += normal.balance_change(posting.debit, posting.credit);
        self.postings += 1;
    }
}

/// Sum of every posting in the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalance {
    /// Total debits across all accounts.
    pub debit_total: Decimal,
    /// Total credits across all accounts.
    pub credit_total: Decimal,
}

impl TrialBalance {
    /// Returns true if debits equal credits.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.debit_total == self.credit_total
    }
}

/// Append-only journal of posted lines.
#[derive(Debug, Default)]
pub struct PostingJournal {
    postings: RwLock<Vec<Posting>>,
}

impl PostingJournal {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends every line of a posted entry as one atomic batch.
    ///
    /// Returns the number of postings appended.
    pub fn append(&self, entry: &Entry, posted_at: DateTime<Utc>) -> usize {
        let mut postings = self
            .postings
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let start = postings.len() as u64;
        postings.extend(entry.lines().iter().enumerate().map(|(i, line)| Posting {
            journal_sequence: start + i as u64 + 1,
            entry_id: entry.id(),
            account_code: line.account_code().trim().to_string(),
            debit: line.debit(),
            credit: line.credit(),
            entry_date: entry.entry_date(),
            posted_at,
        }));
        entry.lines().len()
    }

    /// Number of postings in the journal.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true if nothing has been posted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Returns the postings recorded for one entry.
    #[must_use]
    pub fn postings_for_entry(&self, entry_id: EntryId) -> Vec<Posting> {
        self.read()
            .iter()
            .filter(|p| p.entry_id == entry_id)
            .cloned()
            .collect()
    }

    /// Folds the balance of one account.
    #[must_use]
    pub fn balance(&self, account_code: &str, normal: NormalBalance) -> AccountBalance {
        let mut balance = AccountBalance::new(account_code);
        for posting in self.read().iter().filter(|p| p.account_code == account_code) {
            balance.apply(posting, normal);
        }
        balance
    }

    /// Sums every posting in the journal.
    #[must_use]
    pub fn trial_balance(&self) -> TrialBalance {
        let postings = self.read();
        TrialBalance {
            debit_total: postings.iter().map(|p| p.debit).sum(),
            credit_total: postings.iter().map(|p| p.credit).sum(),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Posting>> {
        self.postings
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::ledger::entry::{EntryKind, Line, NewEntry};

    fn posted_entry(debit_code: &str, credit_code: &str, amount: Decimal) -> Entry {
        let input = NewEntry::new(
            EntryKind::Journal,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            "Office rent",
            vec![
                Line::new_debit(debit_code, amount),
                Line::new_credit(credit_code, amount),
            ],
        );
        Entry::create(input, "JV-000001".to_string(), ledgerline_shared::types::UserId::new())
            .unwrap()
    }

    #[test]
    fn test_debit_normal_balance() {
        assert_eq!(NormalBalance::Debit.balance_change(dec!(100), dec!(30)), dec!(70));
        assert_eq!(NormalBalance::Credit.balance_change(dec!(100), dec!(30)), dec!(-70));
    }

    #[test]
    fn test_append_and_fold() {
        let journal = PostingJournal::new();
        let entry = posted_entry("4100", "2100", dec!(500));
        assert_eq!(journal.append(&entry, Utc::now()), 2);
        journal.append(&posted_entry("4100", "1000", dec!(250)), Utc::now());

        let rent = journal.balance("4100", NormalBalance::Debit);
        assert_eq!(rent.debit_total, dec!(750));
        assert_eq!(rent.balance, dec!(750));
        assert_eq!(rent.postings, 2);

        let payable = journal.balance("2100", NormalBalance::Credit);
        assert_eq!(payable.balance, dec!(500));

        assert_eq!(journal.len(), 4);
        assert_eq!(journal.postings_for_entry(entry.id()).len(), 2);
        assert!(journal.trial_balance().is_balanced());
    }

    #[test]
    fn test_journal_sequence_is_contiguous() {
        let journal = PostingJournal::new();
        journal.append(&posted_entry("4100", "2100", dec!(1)), Utc::now());
        journal.append(&posted_entry("4100", "2100", dec!(2)), Utc::now());
        let sequences: Vec<u64> = journal.read().iter().map(|p| p.journal_sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_unknown_account_has_zero_balance() {
        let journal = PostingJournal::new();
        assert!(journal.is_empty());
        assert_eq!(
            journal.balance("9999", NormalBalance::Debit),
            AccountBalance::new("9999")
        );
    }
}
