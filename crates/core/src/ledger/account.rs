//! Account directory: read-only lookup of ledger accounts.
//!
//! Accounts are owned by the chart of accounts and never created by the
//! ledger core. Every other component resolves line references through an
//! [`AccountDirectory`].

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use ledgerline_shared::types::AccountId;
use moka::sync::Cache;
use serde::{Deserialize, Serialize};

use super::balance::NormalBalance;

/// Default cache capacity (number of accounts).
const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Default time-to-live for cached accounts (10 minutes).
const DEFAULT_TTL_SECS: u64 = 600;

/// Top-level account classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Resources owned.
    Asset,
    /// Obligations owed.
    Liability,
    /// Owner's residual interest.
    Equity,
    /// Revenue and other income.
    Income,
    /// Costs incurred.
    Expense,
}

impl AccountType {
    /// Returns the string representation of the account type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Parses an account type, accepting `revenue` as an alias of `income`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "asset" => Some(Self::Asset),
            "liability" => Some(Self::Liability),
            "equity" => Some(Self::Equity),
            "income" | "revenue" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }

    /// Returns the side on which this account type normally carries its balance.
    #[must_use]
    pub fn normal_balance(&self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Income => NormalBalance::Credit,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ledger account from the chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Short alphanumeric code, unique within the chart.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account classification.
    pub account_type: AccountType,
    /// Optional finer classification (e.g. `bank`, `receivable`).
    pub subtype: Option<String>,
}

impl Account {
    /// Creates an account with a fresh identifier.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            id: AccountId::new(),
            code: code.into(),
            name: name.into(),
            account_type,
            subtype: None,
        }
    }

    /// Sets the account subtype.
    #[must_use]
    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }
}

/// Read-only lookup of valid ledger accounts.
///
/// Implementations must be cheap to call; the core treats lookups as a fast
/// synchronous dependency.
pub trait AccountDirectory: Send + Sync {
    /// Resolves an account by its code.
    fn resolve_account(&self, code: &str) -> Option<Account>;

    /// Resolves an account by its identifier.
    fn account_by_id(&self, id: AccountId) -> Option<Account>;
}

impl<D: AccountDirectory + ?Sized> AccountDirectory for std::sync::Arc<D> {
    fn resolve_account(&self, code: &str) -> Option<Account> {
        (**self).resolve_account(code)
    }

    fn account_by_id(&self, id: AccountId) -> Option<Account> {
        (**self).account_by_id(id)
    }
}

/// Account directory backed by an in-memory chart of accounts.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccountDirectory {
    by_code: HashMap<String, Account>,
    code_by_id: HashMap<AccountId, String>,
}

impl InMemoryAccountDirectory {
    /// Builds a directory from a chart of accounts. Later duplicates of a code win.
    #[must_use]
    pub fn new(accounts: impl IntoIterator<Item = Account>) -> Self {
        let mut directory = Self::default();
        for account in accounts {
            directory.code_by_id.insert(account.id, account.code.clone());
            directory.by_code.insert(account.code.clone(), account);
        }
        directory
    }

    /// Number of accounts in the directory.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    /// Returns true if the directory holds no accounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

impl AccountDirectory for InMemoryAccountDirectory {
    fn resolve_account(&self, code: &str) -> Option<Account> {
        self.by_code.get(code.trim()).cloned()
    }

    fn account_by_id(&self, id: AccountId) -> Option<Account> {
        self.code_by_id
            .get(&id)
            .and_then(|code| self.by_code.get(code))
            .cloned()
    }
}

/// Caching wrapper for a slow account directory.
///
/// Only successful lookups are cached; an unknown code is asked again next time.
pub struct CachedAccountDirectory<D> {
    inner: D,
    cache: Cache<String, Account>,
}

impl<D: AccountDirectory> CachedAccountDirectory<D> {
    /// Wraps a directory with default cache settings.
    ///
    /// Default: 10,000 accounts max, 10 minute TTL.
    #[must_use]
    pub fn new(inner: D) -> Self {
        Self::with_config(inner, DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Wraps a directory with custom cache configuration.
    #[must_use]
    pub fn with_config(inner: D, max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { inner, cache }
    }

    /// Drops every cached account.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

impl<D: AccountDirectory> AccountDirectory for CachedAccountDirectory<D> {
    fn resolve_account(&self, code: &str) -> Option<Account> {
        let code = code.trim();
        if let Some(account) = self.cache.get(code) {
            return Some(account);
        }

        let account = self.inner.resolve_account(code)?;
        self.cache.insert(code.to_string(), account.clone());
        Some(account)
    }

    fn account_by_id(&self, id: AccountId) -> Option<Account> {
        self.inner.account_by_id(id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn chart() -> InMemoryAccountDirectory {
        InMemoryAccountDirectory::new([
            Account::new("1000", "Cash", AccountType::Asset).with_subtype("bank"),
            Account::new("2100", "Accounts Payable", AccountType::Liability),
            Account::new("4100", "Rent Expense", AccountType::Expense),
        ])
    }

    struct CountingDirectory {
        inner: InMemoryAccountDirectory,
        calls: AtomicUsize,
    }

    impl AccountDirectory for CountingDirectory {
        fn resolve_account(&self, code: &str) -> Option<Account> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.resolve_account(code)
        }

        fn account_by_id(&self, id: AccountId) -> Option<Account> {
            self.inner.account_by_id(id)
        }
    }

    #[test]
    fn test_resolve_by_code_and_id() {
        let directory = chart();
        let cash = directory.resolve_account("1000").unwrap();
        assert_eq!(cash.name, "Cash");
        assert_eq!(cash.subtype.as_deref(), Some("bank"));
        assert_eq!(directory.account_by_id(cash.id), Some(cash));
        assert_eq!(directory.len(), 3);
    }

    #[test]
    fn test_resolve_trims_code() {
        assert!(chart().resolve_account(" 2100 ").is_some());
    }

    #[test]
    fn test_unknown_code() {
        assert!(chart().resolve_account("9999").is_none());
        assert!(chart().account_by_id(AccountId::new()).is_none());
    }

    #[test]
    fn test_account_type_parse() {
        assert_eq!(AccountType::parse("Revenue"), Some(AccountType::Income));
        assert_eq!(AccountType::parse("ASSET"), Some(AccountType::Asset));
        assert_eq!(AccountType::parse("other"), None);
    }

    #[test]
    fn test_normal_balance() {
        assert_eq!(AccountType::Asset.normal_balance(), NormalBalance::Debit);
        assert_eq!(AccountType::Expense.normal_balance(), NormalBalance::Debit);
        assert_eq!(AccountType::Liability.normal_balance(), NormalBalance::Credit);
        assert_eq!(AccountType::Income.normal_balance(), NormalBalance::Credit);
    }

    #[test]
    fn test_cached_directory_hits_inner_once() {
        let cached = CachedAccountDirectory::new(CountingDirectory {
            inner: chart(),
            calls: AtomicUsize::new(0),
        });

        assert!(cached.resolve_account("1000").is_some());
        assert!(cached.resolve_account("1000").is_some());
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 1);

        assert!(cached.resolve_account("9999").is_none());
        assert!(cached.resolve_account("9999").is_none());
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 3);
    }
}
