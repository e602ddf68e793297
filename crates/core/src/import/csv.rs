//! Delimited text codec.
//!
//! Parsing is a small state machine over characters with an `in_quotes`
//! flag. Quoted fields may contain the delimiter, line breaks and doubled
//! quotes. Encoding applies the inverse quoting rule, so a parsed payload
//! re-encodes to the same text.

use std::borrow::Cow;

use super::error::ImportError;

/// One parsed row: its fields in column order.
pub type Record = Vec<String>;

/// Rejects delimiters that would collide with quoting or row breaks.
pub fn check_delimiter(delimiter: char) -> Result<(), ImportError> {
    if matches!(delimiter, '"' | '\n' | '\r') {
        Err(ImportError::InvalidDelimiter(delimiter))
    } else {
        Ok(())
    }
}

/// Parses delimited text into records.
///
/// Blank lines are skipped. `\n`, `\r\n` and a lone `\r` all end a row
/// outside quotes and are kept verbatim inside them. A quote opens a quoted
/// section only at the start of a field; elsewhere it is literal text.
///
/// # Errors
///
/// Returns `UnterminatedQuote` if input ends inside a quoted field.
pub fn parse_delimited(text: &str, delimiter: char) -> Result<Vec<Record>, ImportError> {
    check_delimiter(delimiter)?;

    let mut records = Vec::new();
    let mut record: Record = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut in_quotes = false;
    let mut line = 1;
    let mut quote_line = 1;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => {
                    if c == '\n' {
                        line += 1;
                    }
                    field.push(c);
                }
            }
            continue;
        }

        match c {
            '"' if field.is_empty() && !quoted => {
                in_quotes = true;
                quoted = true;
                quote_line = line;
            }
            '\r' | '\n' => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                line += 1;
                let blank = record.is_empty() && field.is_empty() && !quoted;
                record.push(std::mem::take(&mut field));
                quoted = false;
                if blank {
                    record.clear();
                } else {
                    records.push(std::mem::take(&mut record));
                }
            }
            _ if c == delimiter => {
                record.push(std::mem::take(&mut field));
                quoted = false;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(ImportError::UnterminatedQuote { line: quote_line });
    }
    if !record.is_empty() || !field.is_empty() || quoted {
        record.push(field);
        records.push(record);
    }
    Ok(records)
}

/// Quotes a field if it contains the delimiter, a quote or a line break.
#[must_use]
pub fn quote_field(field: &str, delimiter: char) -> Cow<'_, str> {
    if field.contains([delimiter, '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Appends one row, terminated by `\n`, to `out`.
pub fn encode_record<F: AsRef<str>>(fields: &[F], delimiter: char, out: &mut String) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(delimiter);
        }
        out.push_str(&quote_field(field.as_ref(), delimiter));
    }
    out.push('\n');
}

/// Encodes rows as delimited text, one `\n`-terminated line per row.
#[must_use]
pub fn encode_delimited<F: AsRef<str>>(records: &[Vec<F>], delimiter: char) -> String {
    let mut out = String::new();
    for record in records {
        encode_record(record, delimiter, &mut out);
    }
    out
}
