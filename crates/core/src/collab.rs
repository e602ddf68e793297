//! Collaborators the ledger book consumes but does not own.
//!
//! Identity comes from an [`ActorProvider`] and sequence numbers from a
//! [`SequenceAllocator`]. The book records who acted; it performs no role
//! checks beyond requiring that an actor is present.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use ledgerline_shared::types::UserId;

use crate::ledger::entry::EntryKind;

/// Supplies the identity performing the current operation.
pub trait ActorProvider: Send + Sync {
    /// The acting user, or `None` when no identity is available.
    fn current_actor_id(&self) -> Option<UserId>;
}

/// An actor provider that always returns the same identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticActor(pub Option<UserId>);

impl StaticActor {
    /// Provider for a known user.
    #[must_use]
    pub fn new(user: UserId) -> Self {
        Self(Some(user))
    }

    /// Provider with no identity.
    #[must_use]
    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl ActorProvider for StaticActor {
    fn current_actor_id(&self) -> Option<UserId> {
        self.0
    }
}

/// Allocates human-readable sequence numbers.
///
/// Implementations must be monotonic and unique per kind.
pub trait SequenceAllocator: Send + Sync {
    /// Next sequence number for an entry of `kind`.
    fn next_sequence_number(&self, kind: EntryKind) -> String;
}

/// Per-kind counters formatted as `PREFIX-000001`.
#[derive(Debug, Default)]
pub struct PrefixSequenceAllocator {
    counters: DashMap<EntryKind, AtomicU64>,
}

impl PrefixSequenceAllocator {
    /// Creates an allocator with every counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an allocator whose next number for `kind` follows `last`.
    #[must_use]
    pub fn starting_after(self, kind: EntryKind, last: u64) -> Self {
        self.counters.insert(kind, AtomicU64::new(last));
        self
    }
}

impl SequenceAllocator for PrefixSequenceAllocator {
    fn next_sequence_number(&self, kind: EntryKind) -> String {
        let next = self
            .counters
            .entry(kind)
            .or_default()
            .fetch_add(1, Ordering::Relaxed)
            + 1;
        format!("{}-{next:06}", kind.sequence_prefix())
    }
}
