//! Batch import pipeline.
//!
//! Rows are read from a delimited payload, grouped by a key column into
//! candidate entries, and each candidate is checked by the same balance
//! validator that gates interactive submission. One bad group never stops
//! the others.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::str::FromStr;

use chrono::NaiveDate;
use chrono::format::{Item, StrftimeItems};
use ledgerline_shared::config::ImportConfig;
use ledgerline_shared::types::{EntryId, ImportGroupId};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;

use super::csv::{self, Record};
use super::error::{ImportError, RowError};
use crate::ledger::account::AccountDirectory;
use crate::ledger::entry::{Entry, EntryContent, EntryKind, Line, NewEntry};
use crate::ledger::validation::{validate_entry, Violations};

/// Accounting date column.
pub const DATE_COLUMN: &str = "date";
/// Entry kind column.
pub const KIND_COLUMN: &str = "kind";
/// Narration column.
pub const NARRATION_COLUMN: &str = "narration";
/// External reference column.
pub const REFERENCE_COLUMN: &str = "reference";
/// Account code column.
pub const ACCOUNT_COLUMN: &str = "account";
/// Line description column.
pub const DESCRIPTION_COLUMN: &str = "description";
/// Debit amount column.
pub const DEBIT_COLUMN: &str = "debit";
/// Credit amount column.
pub const CREDIT_COLUMN: &str = "credit";

/// Parsed import settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSettings {
    /// Field delimiter.
    pub delimiter: char,
    /// Header of the grouping column.
    pub group_column: String,
    /// `chrono` format of the date column.
    pub date_format: String,
    /// Kind used when a group names none.
    pub default_kind: EntryKind,
    /// Whether committed groups are posted immediately.
    pub post_on_commit: bool,
    /// Whether groups are validated on the rayon pool.
    pub parallel: bool,
}

impl ImportSettings {
    /// Builds settings from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the delimiter, date format or default kind is unusable.
    pub fn from_config(config: &ImportConfig) -> Result<Self, ImportError> {
        csv::check_delimiter(config.delimiter)?;
        check_date_format(&config.date_format)?;
        let default_kind = EntryKind::parse(&config.default_kind)
            .ok_or_else(|| ImportError::UnknownDefaultKind(config.default_kind.clone()))?;

        Ok(Self {
            delimiter: config.delimiter,
            group_column: config.group_column.trim().to_lowercase(),
            date_format: config.date_format.clone(),
            default_kind,
            post_on_commit: config.post_on_commit,
            parallel: config.parallel,
        })
    }

    /// Header row in export order.
    #[must_use]
    pub fn header(&self) -> [&str; 9] {
        [
            self.group_column.as_str(),
            DATE_COLUMN,
            KIND_COLUMN,
            NARRATION_COLUMN,
            REFERENCE_COLUMN,
            ACCOUNT_COLUMN,
            DESCRIPTION_COLUMN,
            DEBIT_COLUMN,
            CREDIT_COLUMN,
        ]
    }
}

/// Rejects strftime patterns chrono cannot render for a plain date.
///
/// Unknown specifiers and time-of-day fields both fail.
///
/// # Errors
///
/// Returns [`ImportError::InvalidDateFormat`].
pub fn check_date_format(format: &str) -> Result<(), ImportError> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(ImportError::InvalidDateFormat(format.to_string()));
    }
    render_date(NaiveDate::MIN, format).map(drop)
}

fn render_date(date: NaiveDate, format: &str) -> Result<String, ImportError> {
    let mut out = String::new();
    write!(out, "{}", date.format(format))
        .map_err(|_| ImportError::InvalidDateFormat(format.to_string()))?;
    Ok(out)
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            delimiter: ',',
            group_column: "group".to_string(),
            date_format: "%Y-%m-%d".to_string(),
            default_kind: EntryKind::Journal,
            post_on_commit: false,
            parallel: true,
        }
    }
}

/// One data row with raw, untrimmed cell values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportRow {
    /// 1-based data row number (the header is not counted).
    pub row: usize,
    /// Grouping key.
    pub group: String,
    /// Accounting date.
    pub date: String,
    /// Entry kind.
    pub kind: String,
    /// Narration.
    pub narration: String,
    /// External reference.
    pub reference: String,
    /// Account code.
    pub account: String,
    /// Line description.
    pub description: String,
    /// Debit amount.
    pub debit: String,
    /// Credit amount.
    pub credit: String,
}

/// Column positions resolved from the header row.
struct ColumnMap {
    group: usize,
    account: usize,
    debit: usize,
    credit: usize,
    date: Option<usize>,
    kind: Option<usize>,
    narration: Option<usize>,
    reference: Option<usize>,
    description: Option<usize>,
}

impl ColumnMap {
    fn from_header(header: &Record, settings: &ImportSettings) -> Result<Self, ImportError> {
        let positions: HashMap<String, usize> = header
            .iter()
            .enumerate()
            .rev()
            .map(|(i, name)| (name.trim().to_lowercase(), i))
            .collect();
        let optional = |name: &str| positions.get(name).copied();
        let required = |name: &str| {
            optional(name).ok_or_else(|| ImportError::MissingColumn(name.to_string()))
        };

        Ok(Self {
            group: required(settings.group_column.as_str())?,
            account: required(ACCOUNT_COLUMN)?,
            debit: required(DEBIT_COLUMN)?,
            credit: required(CREDIT_COLUMN)?,
            date: optional(DATE_COLUMN),
            kind: optional(KIND_COLUMN),
            narration: optional(NARRATION_COLUMN),
            reference: optional(REFERENCE_COLUMN),
            description: optional(DESCRIPTION_COLUMN),
        })
    }

    fn row(&self, row: usize, record: &Record) -> ImportRow {
        let cell = |index: Option<usize>| {
            index
                .and_then(|i| record.get(i))
                .cloned()
                .unwrap_or_default()
        };

        ImportRow {
            row,
            group: cell(Some(self.group)),
            date: cell(self.date),
            kind: cell(self.kind),
            narration: cell(self.narration),
            reference: cell(self.reference),
            account: cell(Some(self.account)),
            description: cell(self.description),
            debit: cell(Some(self.debit)),
            credit: cell(Some(self.credit)),
        }
    }
}

/// Reads the rows of a delimited payload, mapping cells by header name.
///
/// Header names are matched case-insensitively. The group, account, debit
/// and credit columns are required; the rest are optional.
///
/// # Errors
///
/// Returns an error if the payload cannot be parsed or a required column is missing.
pub fn read_rows(text: &str, settings: &ImportSettings) -> Result<Vec<ImportRow>, ImportError> {
    let mut records = csv::parse_delimited(text, settings.delimiter)?.into_iter();
    let header = records.next().ok_or(ImportError::EmptyInput)?;
    let columns = ColumnMap::from_header(&header, settings)?;

    Ok(records
        .enumerate()
        .map(|(i, record)| columns.row(i + 1, &record))
        .collect())
}

/// A group of rows assembled into an entry input.
#[derive(Debug, Clone)]
pub struct ImportCandidate {
    /// The grouping key.
    pub key: String,
    /// Data rows that contributed, in input order.
    pub rows: Vec<usize>,
    /// The assembled entry input.
    pub entry: NewEntry,
    /// Row-level problems found while assembling.
    pub row_errors: Vec<RowError>,
    date_seen: bool,
    kind_seen: bool,
}

impl ImportCandidate {
    fn new(key: String, default_kind: EntryKind) -> Self {
        Self {
            key,
            rows: Vec::new(),
            entry: NewEntry {
                kind: default_kind,
                entry_date: None,
                narration: String::new(),
                reference: None,
                payment: None,
                lines: Vec::new(),
            },
            row_errors: Vec::new(),
            date_seen: false,
            kind_seen: false,
        }
    }

    /// Folds one row in. The first non-empty header value wins.
    fn absorb(&mut self, row: &ImportRow, settings: &ImportSettings) {
        self.rows.push(row.row);

        let date = row.date.trim();
        if !self.date_seen && !date.is_empty() {
            self.date_seen = true;
            match NaiveDate::parse_from_str(date, &settings.date_format) {
                Ok(parsed) => self.entry.entry_date = Some(parsed),
                Err(_) => self.row_errors.push(RowError::InvalidDate {
                    row: row.row,
                    value: date.to_string(),
                }),
            }
        }

        let kind = row.kind.trim();
        if !self.kind_seen && !kind.is_empty() {
            self.kind_seen = true;
            match EntryKind::parse(kind) {
                Some(parsed) => self.entry.kind = parsed,
                None => self.row_errors.push(RowError::UnknownKind {
                    row: row.row,
                    value: kind.to_string(),
                }),
            }
        }

        // Text cells keep their raw value; blank means absent.
        if self.entry.narration.trim().is_empty() && !row.narration.trim().is_empty() {
            self.entry.narration.clone_from(&row.narration);
        }

        if self.entry.reference.is_none() && !row.reference.trim().is_empty() {
            self.entry.reference = Some(row.reference.clone());
        }

        if let Some(line) = self.line(row) {
            self.entry.lines.push(line);
        }
    }

    fn line(&mut self, row: &ImportRow) -> Option<Line> {
        let debit = self.amount(row, DEBIT_COLUMN, &row.debit);
        let credit = self.amount(row, CREDIT_COLUMN, &row.credit);
        let (debit, credit) = (debit?, credit?);

        if !debit.is_zero() && !credit.is_zero() {
            self.row_errors.push(RowError::BothSides { row: row.row });
            return None;
        }

        let code = row.account.as_str();
        let line = if credit.is_zero() {
            Line::new_debit(code, debit)
        } else {
            Line::new_credit(code, credit)
        };
        Some(if row.description.trim().is_empty() {
            line
        } else {
            line.with_description(row.description.as_str())
        })
    }

    fn amount(&mut self, row: &ImportRow, column: &'static str, raw: &str) -> Option<Decimal> {
        let value = raw.trim();
        if value.is_empty() {
            return Some(Decimal::ZERO);
        }
        match Decimal::from_str(value) {
            Ok(amount) => Some(amount),
            Err(_) => {
                self.row_errors.push(RowError::InvalidAmount {
                    row: row.row,
                    column,
                    value: value.to_string(),
                });
                None
            }
        }
    }

    /// Runs the balance validator and produces the group's report.
    #[must_use]
    pub fn validate(self, accounts: &dyn AccountDirectory) -> GroupResult {
        let violations = validate_entry(&self.entry, accounts).err();
        GroupResult::new(self, violations)
    }
}

/// Groups rows by key, preserving first-appearance order of groups and
/// input order of rows within each group.
///
/// Rows with a blank key belong to no group; their errors are returned
/// separately.
#[must_use]
pub fn group_rows(
    rows: &[ImportRow],
    settings: &ImportSettings,
) -> (Vec<ImportCandidate>, Vec<RowError>) {
    let mut candidates: Vec<ImportCandidate> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut orphans = Vec::new();

    for row in rows {
        let key = row.group.trim();
        if key.is_empty() {
            orphans.push(RowError::MissingGroupKey { row: row.row });
            continue;
        }
        let position = *index.entry(key).or_insert_with(|| {
            candidates.push(ImportCandidate::new(key.to_string(), settings.default_kind));
            candidates.len() - 1
        });
        candidates[position].absorb(row, settings);
    }

    (candidates, orphans)
}

/// Validates candidates, on the rayon pool when `parallel` is set.
///
/// Result order matches candidate order either way.
#[must_use]
pub fn validate_candidates(
    candidates: Vec<ImportCandidate>,
    accounts: &dyn AccountDirectory,
    parallel: bool,
) -> Vec<GroupResult> {
    if parallel {
        candidates
            .into_par_iter()
            .map(|candidate| candidate.validate(accounts))
            .collect()
    } else {
        candidates
            .into_iter()
            .map(|candidate| candidate.validate(accounts))
            .collect()
    }
}

/// Outcome of validating one import group.
#[derive(Debug, Clone, Serialize)]
pub struct GroupResult {
    /// Identifier used to select the group for commit.
    pub id: ImportGroupId,
    /// The grouping key.
    pub key: String,
    /// Data rows in the group.
    pub rows: Vec<usize>,
    /// Entry kind.
    pub kind: EntryKind,
    /// Accounting date, if one parsed.
    pub entry_date: Option<NaiveDate>,
    /// Narration.
    pub narration: String,
    /// Number of lines assembled.
    pub line_count: usize,
    /// Sum of debit amounts.
    pub total_debit: Decimal,
    /// Sum of credit amounts.
    pub total_credit: Decimal,
    /// Whether the group may be committed.
    pub valid: bool,
    /// Human-readable problems, row errors first.
    pub errors: Vec<String>,
    #[serde(skip)]
    candidate: NewEntry,
}

impl GroupResult {
    fn new(candidate: ImportCandidate, violations: Option<Violations>) -> Self {
        let mut errors: Vec<String> = candidate
            .row_errors
            .iter()
            .map(ToString::to_string)
            .collect();
        if let Some(violations) = &violations {
            errors.extend(violations.messages());
        }

        let entry = candidate.entry;
        Self {
            id: ImportGroupId::new(),
            key: candidate.key,
            rows: candidate.rows,
            kind: entry.kind,
            entry_date: entry.entry_date,
            narration: entry.narration.clone(),
            line_count: entry.lines.len(),
            total_debit: entry.total_debit(),
            total_credit: entry.total_credit(),
            valid: errors.is_empty(),
            errors,
            candidate: entry,
        }
    }

    /// The entry input this group commits as.
    #[must_use]
    pub fn candidate(&self) -> &NewEntry {
        &self.candidate
    }
}

/// Per-group outcome of an import run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    /// Groups in first-appearance order.
    pub groups: Vec<GroupResult>,
    /// Errors for rows that belong to no group.
    pub ungrouped: Vec<RowError>,
}

impl ImportReport {
    /// Number of groups that may be committed.
    #[must_use]
    pub fn valid_count(&self) -> usize {
        self.groups.iter().filter(|g| g.valid).count()
    }

    /// Number of groups that may not be committed.
    #[must_use]
    pub fn invalid_count(&self) -> usize {
        self.groups.len() - self.valid_count()
    }

    /// Identifiers of every group.
    #[must_use]
    pub fn group_ids(&self) -> Vec<ImportGroupId> {
        self.groups.iter().map(|g| g.id).collect()
    }

    /// Identifiers of the valid groups.
    #[must_use]
    pub fn valid_ids(&self) -> Vec<ImportGroupId> {
        self.groups.iter().filter(|g| g.valid).map(|g| g.id).collect()
    }

    /// Finds a group by key.
    #[must_use]
    pub fn group(&self, key: &str) -> Option<&GroupResult> {
        self.groups.iter().find(|g| g.key == key)
    }
}

/// Why a requested group was not committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitFailure {
    /// The requested group.
    pub group_id: ImportGroupId,
    /// What went wrong.
    pub reason: String,
}

/// Result of committing a selection of groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    /// Number of groups requested.
    pub total: usize,
    /// Number of entries created.
    pub succeeded: usize,
    /// Number of requested groups not committed.
    pub failed: usize,
    /// Entries created, in request order.
    pub created: Vec<EntryId>,
    /// One record per failed group.
    pub failures: Vec<CommitFailure>,
}

impl CommitSummary {
    pub(crate) fn record_success(&mut self, entry_id: EntryId) {
        self.total += 1;
        self.succeeded += 1;
        self.created.push(entry_id);
    }

    pub(crate) fn record_failure(&mut self, group_id: ImportGroupId, reason: impl Into<String>) {
        self.total += 1;
        self.failed += 1;
        self.failures.push(CommitFailure {
            group_id,
            reason: reason.into(),
        });
    }
}

/// Flattens entries into delimited rows with a header, one row per line.
///
/// Header values are repeated on every row of an entry; amounts on the
/// unused side are left empty.
///
/// # Errors
///
/// Returns [`ImportError::InvalidDateFormat`] if the settings' date format
/// cannot be rendered.
pub fn export_entries<'a>(
    entries: impl IntoIterator<Item = &'a Entry>,
    settings: &ImportSettings,
) -> Result<String, ImportError> {
    check_date_format(&settings.date_format)?;
    let mut out = String::new();
    csv::encode_record(&settings.header(), settings.delimiter, &mut out);

    for entry in entries {
        let date = render_date(entry.entry_date(), &settings.date_format)?;
        for line in entry.lines() {
            let fields = [
                entry.sequence_number().to_string(),
                date.clone(),
                entry.kind().as_str().to_string(),
                entry.narration().to_string(),
                entry.reference().unwrap_or_default().to_string(),
                line.account_code().to_string(),
                line.description().unwrap_or_default().to_string(),
                amount_cell(line.debit()),
                amount_cell(line.credit()),
            ];
            csv::encode_record(&fields, settings.delimiter, &mut out);
        }
    }
    Ok(out)
}

/// An import template: the header row only.
#[must_use]
pub fn template(settings: &ImportSettings) -> String {
    let mut out = String::new();
    csv::encode_record(&settings.header(), settings.delimiter, &mut out);
    out
}

fn amount_cell(amount: Decimal) -> String {
    if amount.is_zero() {
        String::new()
    } else {
        amount.to_string()
    }
}
