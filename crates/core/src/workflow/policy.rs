//! Per-kind workflow configuration.
//!
//! Journal entries and vouchers share one state machine. The only
//! difference between the two skins is whether `approve` chains straight
//! into `post`, which is configured here per entry kind.

use std::collections::HashSet;

use ledgerline_shared::config::LedgerConfig;
use thiserror::Error;

use crate::ledger::entry::EntryKind;

/// An entry kind name that did not parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown entry kind: {0}")]
pub struct UnknownEntryKind(pub String);

/// Workflow configuration shared by every entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowPolicy {
    auto_post_kinds: HashSet<EntryKind>,
    allow_backdated_reversal: bool,
}

impl WorkflowPolicy {
    /// Policy where no kind auto-posts and back-dated reversals are rejected.
    #[must_use]
    pub fn manual() -> Self {
        Self {
            auto_post_kinds: HashSet::new(),
            allow_backdated_reversal: false,
        }
    }

    /// Builds the policy from configuration.
    pub fn from_config(config: &LedgerConfig) -> Result<Self, UnknownEntryKind> {
        let auto_post_kinds = config
            .auto_post_kinds
            .iter()
            .map(|name| EntryKind::parse(name).ok_or_else(|| UnknownEntryKind(name.clone())))
            .collect::<Result<_, _>>()?;

        Ok(Self {
            auto_post_kinds,
            allow_backdated_reversal: config.allow_backdated_reversal,
        })
    }

    /// Makes approval of `kind` post in the same step.
    #[must_use]
    pub fn with_auto_post(mut self, kind: EntryKind) -> Self {
        self.auto_post_kinds.insert(kind);
        self
    }

    /// Permits reversals dated before the original entry.
    #[must_use]
    pub fn with_backdated_reversals(mut self, allow: bool) -> Self {
        self.allow_backdated_reversal = allow;
        self
    }

    /// Returns true if approving an entry of this kind also posts it.
    #[must_use]
    pub fn auto_posts(&self, kind: EntryKind) -> bool {
        self.auto_post_kinds.contains(&kind)
    }

    /// Returns true if back-dated reversals are permitted.
    #[must_use]
    pub fn allows_backdated_reversal(&self) -> bool {
        self.allow_backdated_reversal
    }
}

impl Default for WorkflowPolicy {
    /// Vouchers auto-post on approval; journal entries need a separate post.
    fn default() -> Self {
        Self {
            auto_post_kinds: EntryKind::ALL
                .into_iter()
                .filter(EntryKind::is_voucher)
                .collect(),
            allow_backdated_reversal: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_matches_default_config() {
        let from_config = WorkflowPolicy::from_config(&LedgerConfig::default()).unwrap();
        assert_eq!(from_config, WorkflowPolicy::default());
        assert!(!from_config.auto_posts(EntryKind::Journal));
        assert!(from_config.auto_posts(EntryKind::Payment));
        assert!(!from_config.allows_backdated_reversal());
    }

    #[test]
    fn test_unknown_kind_in_config() {
        let config = LedgerConfig {
            auto_post_kinds: vec!["payment".to_string(), "memo".to_string()],
            allow_backdated_reversal: true,
        };
        assert_eq!(
            WorkflowPolicy::from_config(&config),
            Err(UnknownEntryKind("memo".to_string()))
        );
    }

    #[test]
    fn test_manual_policy_builder() {
        let policy = WorkflowPolicy::manual()
            .with_auto_post(EntryKind::Receipt)
            .with_backdated_reversals(true);
        assert!(policy.auto_posts(EntryKind::Receipt));
        assert!(!policy.auto_posts(EntryKind::Payment));
        assert!(policy.allows_backdated_reversal());
    }
}
