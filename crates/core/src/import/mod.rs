//! Batch import of entries from delimited text.
//!
//! # Modules
//!
//! - `csv` - Quote-aware delimited text parsing and encoding
//! - `pipeline` - Row grouping, group validation, reports and export
//! - `error` - Payload and row error types

pub mod csv;
pub mod error;
pub mod pipeline;

#[cfg(test)]
mod csv_props;

pub use error::{ImportError, RowError};
pub use pipeline::{
    export_entries, group_rows, read_rows, template, validate_candidates, CommitFailure,
    CommitSummary, GroupResult, ImportCandidate, ImportReport, ImportRow, ImportSettings,
};
