//! Core ledger logic for Ledgerline.
//!
//! This crate contains the double-entry rules with no storage or transport
//! dependencies. Entries are built, balanced, moved through the approval
//! workflow, posted, reversed and bulk-imported here.
//!
//! # Modules
//!
//! - `ledger` - Accounts, entries, the balance validator and the posting journal
//! - `workflow` - Lifecycle state machine and reversal generation
//! - `import` - Delimited text codec and the batch import pipeline
//! - `book` - Concurrent entry store exposing every ledger operation
//! - `collab` - Identity and sequence-number collaborators

pub mod book;
pub mod collab;
pub mod import;
pub mod ledger;
pub mod workflow;

pub use book::LedgerBook;
pub use collab::{ActorProvider, PrefixSequenceAllocator, SequenceAllocator, StaticActor};
