//! Double-entry bookkeeping logic.
//!
//! This module implements the core ledger functionality:
//! - Account directory lookups
//! - Entries and lines (journal entries and vouchers)
//! - Balance validation
//! - Balances derived from the posting journal
//! - Error types for ledger operations

pub mod account;
pub mod balance;
pub mod entry;
pub mod error;
pub mod validation;

#[cfg(test)]
mod validation_props;

pub use account::{Account, AccountDirectory, AccountType, CachedAccountDirectory, InMemoryAccountDirectory};
pub use balance::{AccountBalance, NormalBalance, Posting, PostingJournal, TrialBalance};
pub use entry::{
    AuditTrail, Entry, EntryContent, EntryKind, Line, LineUpdate, NewEntry, PaymentDetails,
    PaymentMode, Side, MIN_LINES,
};
pub use error::{Constraint, LedgerError};
pub use validation::{validate_entry, Violation, Violations};
