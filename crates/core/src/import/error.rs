//! Batch import error types.
//!
//! [`ImportError`] fails the whole payload. [`RowError`] is attached to the
//! one group it affects and never stops other groups from importing.

use serde::Serialize;
use thiserror::Error;

/// Payload-level failures: nothing can be grouped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    /// A quoted field was still open at the end of input.
    #[error("Unterminated quoted field starting on line {line}")]
    UnterminatedQuote {
        /// 1-based physical line where the quote opened.
        line: usize,
    },

    /// The payload has no header row.
    #[error("Import payload is empty")]
    EmptyInput,

    /// A required column is absent from the header.
    #[error("Required column '{0}' is missing from the header")]
    MissingColumn(String),

    /// The configured delimiter cannot be used.
    #[error("Delimiter {0:?} is not allowed")]
    InvalidDelimiter(char),

    /// The configured date format has an unknown specifier.
    #[error("Date format '{0}' is not a valid strftime pattern")]
    InvalidDateFormat(String),

    /// The configured default kind does not parse.
    #[error("Unknown default entry kind: {0}")]
    UnknownDefaultKind(String),
}

impl ImportError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnterminatedQuote { .. } => "UNTERMINATED_QUOTE",
            Self::EmptyInput => "EMPTY_INPUT",
            Self::MissingColumn(_) => "MISSING_COLUMN",
            Self::InvalidDelimiter(_) => "INVALID_DELIMITER",
            Self::InvalidDateFormat(_) => "INVALID_DATE_FORMAT",
            Self::UnknownDefaultKind(_) => "UNKNOWN_DEFAULT_KIND",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::UnknownDefaultKind(_)
            | Self::InvalidDelimiter(_)
            | Self::InvalidDateFormat(_) => 500,
            _ => 400,
        }
    }
}

/// A problem with one data row.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowError {
    /// The grouping column is blank.
    #[error("row {row}: group key is missing")]
    MissingGroupKey {
        /// 1-based data row.
        row: usize,
    },

    /// The date does not match the configured format.
    #[error("row {row}: invalid date '{value}'")]
    InvalidDate {
        /// 1-based data row.
        row: usize,
        /// The raw value.
        value: String,
    },

    /// An amount is not a decimal number.
    #[error("row {row}: invalid {column} amount '{value}'")]
    InvalidAmount {
        /// 1-based data row.
        row: usize,
        /// `debit` or `credit`.
        column: &'static str,
        /// The raw value.
        value: String,
    },

    /// Both debit and credit carry a non-zero amount.
    #[error("row {row}: both debit and credit are set")]
    BothSides {
        /// 1-based data row.
        row: usize,
    },

    /// The kind column does not name an entry kind.
    #[error("row {row}: unknown entry kind '{value}'")]
    UnknownKind {
        /// 1-based data row.
        row: usize,
        /// The raw value.
        value: String,
    },
}

impl RowError {
    /// The 1-based data row the error refers to.
    #[must_use]
    pub fn row(&self) -> usize {
        match self {
            Self::MissingGroupKey { row }
            | Self::InvalidDate { row, .. }
            | Self::InvalidAmount { row, .. }
            | Self::BothSides { row }
            | Self::UnknownKind { row, .. } => *row,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_error_codes() {
        let err = ImportError::UnterminatedQuote { line: 4 };
        assert_eq!(err.error_code(), "UNTERMINATED_QUOTE");
        assert_eq!(err.status_code(), 400);
        assert_eq!(
            err.to_string(),
            "Unterminated quoted field starting on line 4"
        );

        let err = ImportError::MissingColumn("account".to_string());
        assert_eq!(
            err.to_string(),
            "Required column 'account' is missing from the header"
        );
    }

    #[test]
    fn test_row_error_messages() {
        let err = RowError::InvalidAmount {
            row: 3,
            column: "debit",
            value: "12,5".to_string(),
        };
        assert_eq!(err.to_string(), "row 3: invalid debit amount '12,5'");
        assert_eq!(err.row(), 3);
        assert_eq!(
            RowError::BothSides { row: 7 }.to_string(),
            "row 7: both debit and credit are set"
        );
    }
}
