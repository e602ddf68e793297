//! Ledger entry domain types.
//!
//! An [`Entry`] is a journal entry or voucher: one abstraction with a
//! [`EntryKind`] tag. Its [`Line`]s are exclusively owned and may only be
//! changed while the entry is a draft. Totals are always derived from lines.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use ledgerline_shared::types::{EntryId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::{Constraint, LedgerError};
use super::validation::{Violation, Violations};
use crate::workflow::types::{EntryStatus, WorkflowAction};

/// Minimum number of lines in an entry.
pub const MIN_LINES: usize = 2;

/// Entry kind: the "skin" an entry is presented under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    /// General journal entry.
    Journal,
    /// Transfer between cash and bank accounts.
    Contra,
    /// Outgoing payment voucher.
    Payment,
    /// Incoming receipt voucher.
    Receipt,
    /// Sales voucher.
    Sales,
    /// Purchase voucher.
    Purchase,
    /// Debit note.
    DebitNote,
    /// Credit note.
    CreditNote,
}

impl EntryKind {
    /// Every entry kind.
    pub const ALL: [Self; 8] = [
        Self::Journal,
        Self::Contra,
        Self::Payment,
        Self::Receipt,
        Self::Sales,
        Self::Purchase,
        Self::DebitNote,
        Self::CreditNote,
    ];

    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Journal => "journal",
            Self::Contra => "contra",
            Self::Payment => "payment",
            Self::Receipt => "receipt",
            Self::Sales => "sales",
            Self::Purchase => "purchase",
            Self::DebitNote => "debit_note",
            Self::CreditNote => "credit_note",
        }
    }

    /// Parses a kind case-insensitively; spaces and dashes count as underscores.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
    }

    /// Prefix used when allocating sequence numbers.
    #[must_use]
    pub fn sequence_prefix(&self) -> &'static str {
        match self {
            Self::Journal => "JV",
            Self::Contra => "CV",
            Self::Payment => "PV",
            Self::Receipt => "RV",
            Self::Sales => "SV",
            Self::Purchase => "PUV",
            Self::DebitNote => "DN",
            Self::CreditNote => "CN",
        }
    }

    /// Returns true for the voucher skin (every kind except journal).
    #[must_use]
    pub fn is_voucher(&self) -> bool {
        !matches!(self, Self::Journal)
    }

    /// Returns true if payment details may be attached to this kind.
    #[must_use]
    pub fn supports_payment_details(&self) -> bool {
        matches!(self, Self::Contra | Self::Payment | Self::Receipt)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a payment, receipt or contra voucher was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    /// Cash.
    Cash,
    /// Cheque.
    Cheque,
    /// Bank transfer (NEFT, RTGS, wire).
    BankTransfer,
    /// Card.
    Card,
    /// UPI.
    Upi,
}

/// Payment metadata attached to payment-like vouchers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    /// Settlement mode.
    pub mode: PaymentMode,
    /// Cheque number, for cheque payments.
    pub cheque_number: Option<String>,
    /// Bank account the payment moved through.
    pub bank_account: Option<String>,
    /// Bank or gateway transaction reference.
    pub transaction_reference: Option<String>,
}

impl PaymentDetails {
    /// Creates payment details with only the mode set.
    #[must_use]
    pub fn new(mode: PaymentMode) -> Self {
        Self {
            mode,
            cheque_number: None,
            bank_account: None,
            transaction_reference: None,
        }
    }
}

/// Side of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Debit side.
    Debit,
    /// Credit side.
    Credit,
}

/// One debit-or-credit component of an entry.
///
/// At most one of debit and credit is non-zero: setting one clears the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Line {
    account_code: String,
    description: Option<String>,
    debit: Decimal,
    credit: Decimal,
}

impl Line {
    /// Creates a debit line.
    #[must_use]
    pub fn new_debit(account_code: impl Into<String>, amount: Decimal) -> Self {
        Self {
            account_code: account_code.into(),
            description: None,
            debit: amount,
            credit: Decimal::ZERO,
        }
    }

    /// Creates a credit line.
    #[must_use]
    pub fn new_credit(account_code: impl Into<String>, amount: Decimal) -> Self {
        Self {
            account_code: account_code.into(),
            description: None,
            debit: Decimal::ZERO,
            credit: amount,
        }
    }

    /// Sets the line description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Code of the referenced account.
    #[must_use]
    pub fn account_code(&self) -> &str {
        &self.account_code
    }

    /// Optional per-line description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Debit amount (0 if credit).
    #[must_use]
    pub fn debit(&self) -> Decimal {
        self.debit
    }

    /// Credit amount (0 if debit).
    #[must_use]
    pub fn credit(&self) -> Decimal {
        self.credit
    }

    /// The non-zero side, if any.
    #[must_use]
    pub fn side(&self) -> Option<Side> {
        if !self.debit.is_zero() {
            Some(Side::Debit)
        } else if !self.credit.is_zero() {
            Some(Side::Credit)
        } else {
            None
        }
    }

    /// The amount on the line's side (0 for an empty line).
    #[must_use]
    pub fn amount(&self) -> Decimal {
        if self.debit.is_zero() {
            self.credit
        } else {
            self.debit
        }
    }

    /// Sets the debit amount, clearing credit when the amount is non-zero.
    pub fn set_debit(&mut self, amount: Decimal) {
        self.debit = amount;
        if !amount.is_zero() {
            self.credit = Decimal::ZERO;
        }
    }

    /// Sets the credit amount, clearing debit when the amount is non-zero.
    pub fn set_credit(&mut self, amount: Decimal) {
        self.credit = amount;
        if !amount.is_zero() {
            self.debit = Decimal::ZERO;
        }
    }

    /// Returns a copy with debit and credit swapped.
    #[must_use]
    pub fn swapped(&self) -> Self {
        Self {
            account_code: self.account_code.clone(),
            description: self.description.clone(),
            debit: self.credit,
            credit: self.debit,
        }
    }
}

/// A single-field change to a draft line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineUpdate {
    /// Point the line at another account.
    Account(String),
    /// Replace the description.
    Description(Option<String>),
    /// Set the debit amount (clears credit).
    Debit(Decimal),
    /// Set the credit amount (clears debit).
    Credit(Decimal),
}

/// Read access shared by entries and entry inputs, used by the balance validator.
pub trait EntryContent {
    /// Accounting date, if supplied.
    fn date(&self) -> Option<NaiveDate>;

    /// Free-text narration.
    fn narration(&self) -> &str;

    /// Lines in insertion order.
    fn lines(&self) -> &[Line];

    /// Sum of debit amounts.
    fn total_debit(&self) -> Decimal {
        self.lines().iter().map(Line::debit).sum()
    }

    /// Sum of credit amounts.
    fn total_credit(&self) -> Decimal {
        self.lines().iter().map(Line::credit).sum()
    }
}

/// Input for creating a new entry.
#[derive(Debug, Clone)]
pub struct NewEntry {
    /// The entry kind.
    pub kind: EntryKind,
    /// The accounting date.
    pub entry_date: Option<NaiveDate>,
    /// Narration (required).
    pub narration: String,
    /// Optional external reference (invoice, PO or cheque number).
    pub reference: Option<String>,
    /// Optional payment metadata.
    pub payment: Option<PaymentDetails>,
    /// The lines (at least 2).
    pub lines: Vec<Line>,
}

impl NewEntry {
    /// Creates an entry input with a date.
    #[must_use]
    pub fn new(
        kind: EntryKind,
        entry_date: NaiveDate,
        narration: impl Into<String>,
        lines: Vec<Line>,
    ) -> Self {
        Self {
            kind,
            entry_date: Some(entry_date),
            narration: narration.into(),
            reference: None,
            payment: None,
            lines,
        }
    }

    /// Sets the external reference.
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Attaches payment details.
    #[must_use]
    pub fn with_payment(mut self, payment: PaymentDetails) -> Self {
        self.payment = Some(payment);
        self
    }
}

impl EntryContent for NewEntry {
    fn date(&self) -> Option<NaiveDate> {
        self.entry_date
    }

    fn narration(&self) -> &str {
        &self.narration
    }

    fn lines(&self) -> &[Line] {
        &self.lines
    }
}

/// Who moved the entry through its lifecycle, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditTrail {
    /// Creator.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Submitter.
    pub submitted_by: Option<UserId>,
    /// Submission timestamp.
    pub submitted_at: Option<DateTime<Utc>>,
    /// Approver.
    pub approved_by: Option<UserId>,
    /// Approval timestamp.
    pub approved_at: Option<DateTime<Utc>>,
    /// Actor who posted the entry.
    pub posted_by: Option<UserId>,
    /// Posting timestamp.
    pub posted_at: Option<DateTime<Utc>>,
    /// Actor who rejected or cancelled the entry.
    pub closed_by: Option<UserId>,
    /// Rejection or cancellation timestamp.
    pub closed_at: Option<DateTime<Utc>>,
}

/// A journal entry or voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    id: EntryId,
    sequence_number: String,
    kind: EntryKind,
    entry_date: NaiveDate,
    narration: String,
    reference: Option<String>,
    payment: Option<PaymentDetails>,
    status: EntryStatus,
    reverses: Option<EntryId>,
    reversed_by: Option<EntryId>,
    rejection_reason: Option<String>,
    cancellation_reason: Option<String>,
    lines: Vec<Line>,
    audit: AuditTrail,
    version: u64,
}

impl Entry {
    /// Creates a draft entry.
    ///
    /// Drafts need a date, a narration and at least two lines; they need not
    /// balance until submitted.
    pub fn create(
        input: NewEntry,
        sequence_number: String,
        created_by: UserId,
    ) -> Result<Self, LedgerError> {
        let mut violations = Vec::new();
        if input.entry_date.is_none() {
            violations.push(Violation::MissingDate);
        }
        if input.narration.trim().is_empty() {
            violations.push(Violation::MissingNarration);
        }
        if input.lines.len() < MIN_LINES {
            violations.push(Violation::InsufficientLines {
                count: input.lines.len(),
            });
        }
        let Some(entry_date) = input.entry_date.filter(|_| violations.is_empty()) else {
            return Err(LedgerError::Validation(Violations::from(violations)));
        };

        if input.payment.is_some() && !input.kind.supports_payment_details() {
            return Err(LedgerError::ConstraintViolation(
                Constraint::PaymentDetailsNotAllowed { kind: input.kind },
            ));
        }

        Ok(Self {
            id: EntryId::new(),
            sequence_number,
            kind: input.kind,
            entry_date,
            narration: input.narration,
            reference: input.reference,
            payment: input.payment,
            status: EntryStatus::Draft,
            reverses: None,
            reversed_by: None,
            rejection_reason: None,
            cancellation_reason: None,
            lines: input.lines,
            audit: AuditTrail {
                created_by,
                created_at: Utc::now(),
                submitted_by: None,
                submitted_at: None,
                approved_by: None,
                approved_at: None,
                posted_by: None,
                posted_at: None,
                closed_by: None,
                closed_at: None,
            },
            version: 0,
        })
    }

    /// Unique identifier.
    #[must_use]
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// Human-readable sequence number.
    #[must_use]
    pub fn sequence_number(&self) -> &str {
        &self.sequence_number
    }

    /// Entry kind.
    #[must_use]
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Accounting date.
    #[must_use]
    pub fn entry_date(&self) -> NaiveDate {
        self.entry_date
    }

    /// Narration.
    #[must_use]
    pub fn narration(&self) -> &str {
        &self.narration
    }

    /// External reference.
    #[must_use]
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    /// Payment metadata.
    #[must_use]
    pub fn payment(&self) -> Option<&PaymentDetails> {
        self.payment.as_ref()
    }

    /// Lifecycle status.
    #[must_use]
    pub fn status(&self) -> EntryStatus {
        self.status
    }

    /// The entry this one reverses.
    #[must_use]
    pub fn reverses(&self) -> Option<EntryId> {
        self.reverses
    }

    /// The reversal created from this entry.
    #[must_use]
    pub fn reversed_by(&self) -> Option<EntryId> {
        self.reversed_by
    }

    /// Reason recorded on rejection.
    #[must_use]
    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    /// Reason recorded on cancellation.
    #[must_use]
    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Audit trail.
    #[must_use]
    pub fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    /// Store version, incremented on every committed change.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Sum of debit amounts.
    #[must_use]
    pub fn total_debit(&self) -> Decimal {
        EntryContent::total_debit(self)
    }

    /// Sum of credit amounts.
    #[must_use]
    pub fn total_credit(&self) -> Decimal {
        EntryContent::total_credit(self)
    }

    /// Debit total minus credit total.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.total_debit() - self.total_credit()
    }

    fn ensure_editable(&self, operation: &'static str) -> Result<(), LedgerError> {
        if self.status.is_editable() {
            Ok(())
        } else {
            Err(LedgerError::InvalidState {
                status: self.status,
                operation,
            })
        }
    }

    /// Appends a line.
    pub fn add_line(&mut self, line: Line) -> Result<(), LedgerError> {
        self.ensure_editable("add line")?;
        self.lines.push(line);
        Ok(())
    }

    /// Removes and returns the line at `index`.
    ///
    /// Fails if the entry would be left with fewer than two lines.
    pub fn remove_line(&mut self, index: usize) -> Result<Line, LedgerError> {
        self.ensure_editable("remove line")?;
        self.check_index(index)?;
        if self.lines.len() <= MIN_LINES {
            return Err(LedgerError::ConstraintViolation(Constraint::MinimumLines {
                minimum: MIN_LINES,
                actual: self.lines.len() - 1,
            }));
        }
        Ok(self.lines.remove(index))
    }

    /// Changes one field of the line at `index`.
    pub fn update_line(&mut self, index: usize, update: LineUpdate) -> Result<(), LedgerError> {
        self.ensure_editable("update line")?;
        self.check_index(index)?;
        let line = &mut self.lines[index];
        match update {
            LineUpdate::Account(code) => line.account_code = code,
            LineUpdate::Description(description) => line.description = description,
            LineUpdate::Debit(amount) => line.set_debit(amount),
            LineUpdate::Credit(amount) => line.set_credit(amount),
        }
        Ok(())
    }

    /// Replaces every line at once.
    pub fn replace_lines(&mut self, lines: Vec<Line>) -> Result<(), LedgerError> {
        self.ensure_editable("replace lines")?;
        if lines.len() < MIN_LINES {
            return Err(LedgerError::ConstraintViolation(Constraint::MinimumLines {
                minimum: MIN_LINES,
                actual: lines.len(),
            }));
        }
        self.lines = lines;
        Ok(())
    }

    /// Changes the narration.
    pub fn set_narration(&mut self, narration: impl Into<String>) -> Result<(), LedgerError> {
        self.ensure_editable("set narration")?;
        self.narration = narration.into();
        Ok(())
    }

    /// Changes the accounting date.
    pub fn set_entry_date(&mut self, entry_date: NaiveDate) -> Result<(), LedgerError> {
        self.ensure_editable("set date")?;
        self.entry_date = entry_date;
        Ok(())
    }

    /// Changes the external reference.
    pub fn set_reference(&mut self, reference: Option<String>) -> Result<(), LedgerError> {
        self.ensure_editable("set reference")?;
        self.reference = reference;
        Ok(())
    }

    /// Attaches or clears payment details.
    pub fn set_payment(&mut self, payment: Option<PaymentDetails>) -> Result<(), LedgerError> {
        self.ensure_editable("set payment details")?;
        if payment.is_some() && !self.kind.supports_payment_details() {
            return Err(LedgerError::ConstraintViolation(
                Constraint::PaymentDetailsNotAllowed { kind: self.kind },
            ));
        }
        self.payment = payment;
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), LedgerError> {
        if index < self.lines.len() {
            Ok(())
        } else {
            Err(LedgerError::LineNotFound {
                index,
                count: self.lines.len(),
            })
        }
    }

    /// Applies a validated workflow action.
    pub(crate) fn apply(&mut self, action: &WorkflowAction) {
        self.status = action.new_status();
        match action {
            WorkflowAction::Submit {
                submitted_by,
                submitted_at,
                ..
            } => {
                self.audit.submitted_by = Some(*submitted_by);
                self.audit.submitted_at = Some(*submitted_at);
            }
            WorkflowAction::Approve {
                approved_by,
                approved_at,
                ..
            } => {
                self.audit.approved_by = Some(*approved_by);
                self.audit.approved_at = Some(*approved_at);
                if self.status == EntryStatus::Posted {
                    self.audit.posted_by = Some(*approved_by);
                    self.audit.posted_at = Some(*approved_at);
                }
            }
            WorkflowAction::Reject {
                rejected_by,
                rejected_at,
                rejection_reason,
                ..
            } => {
                self.rejection_reason = Some(rejection_reason.clone());
                self.audit.closed_by = Some(*rejected_by);
                self.audit.closed_at = Some(*rejected_at);
            }
            WorkflowAction::Post {
                posted_by,
                posted_at,
                ..
            } => {
                self.audit.posted_by = Some(*posted_by);
                self.audit.posted_at = Some(*posted_at);
            }
            WorkflowAction::Cancel {
                cancelled_by,
                cancelled_at,
                cancellation_reason,
                ..
            } => {
                self.rejection_reason = None;
                self.cancellation_reason = Some(cancellation_reason.clone());
                self.audit.closed_by = Some(*cancelled_by);
                self.audit.closed_at = Some(*cancelled_at);
            }
        }
    }

    pub(crate) fn link_reversal(&mut self, reversal: EntryId) {
        self.reversed_by = Some(reversal);
    }

    pub(crate) fn mark_reverses(&mut self, source: EntryId) {
        self.reverses = Some(source);
    }

    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }
}

impl EntryContent for Entry {
    fn date(&self) -> Option<NaiveDate> {
        Some(self.entry_date)
    }

    fn narration(&self) -> &str {
        &self.narration
    }

    fn lines(&self) -> &[Line] {
        &self.lines
    }
}
