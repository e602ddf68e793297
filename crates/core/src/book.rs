//! The ledger book: entry store, posting journal and import staging.
//!
//! Every lifecycle operation reads a snapshot, decides the transition with
//! [`WorkflowService`] outside any lock, then writes back only if the
//! entry's version is unchanged. A caller that loses the race gets
//! [`WorkflowError::ConcurrentModification`] and nothing is applied.
//! Posting appends to the journal while the entry's slot is still held,
//! so an entry is counted against balances at most once.

use chrono::NaiveDate;
use dashmap::DashMap;
use ledgerline_shared::types::{EntryId, ImportGroupId, UserId};
use tracing::{debug, info, warn};

use crate::collab::{ActorProvider, PrefixSequenceAllocator, SequenceAllocator, StaticActor};
use crate::import::error::ImportError;
use crate::import::pipeline::{
    self, group_rows, read_rows, validate_candidates, CommitSummary, GroupResult, ImportReport,
    ImportRow, ImportSettings,
};
use crate::ledger::account::AccountDirectory;
use crate::ledger::balance::{AccountBalance, PostingJournal, TrialBalance};
use crate::ledger::entry::{Entry, Line, NewEntry};
use crate::ledger::error::LedgerError;
use crate::ledger::validation::validate_entry;
use crate::workflow::error::WorkflowError;
use crate::workflow::policy::WorkflowPolicy;
use crate::workflow::reversal::{ReversalRequest, ReversalService};
use crate::workflow::service::WorkflowService;
use crate::workflow::types::{EntryStatus, WorkflowAction};

/// In-memory ledger of entries and their postings.
pub struct LedgerBook<D, S = PrefixSequenceAllocator, A = StaticActor> {
    accounts: D,
    sequences: S,
    actors: A,
    policy: WorkflowPolicy,
    import: ImportSettings,
    entries: DashMap<EntryId, Entry>,
    journal: PostingJournal,
    staged: DashMap<ImportGroupId, GroupResult>,
}

impl<D, S, A> LedgerBook<D, S, A>
where
    D: AccountDirectory,
    S: SequenceAllocator,
    A: ActorProvider,
{
    /// Creates an empty book with the default policy and import settings.
    pub fn new(accounts: D, sequences: S, actors: A) -> Self {
        Self {
            accounts,
            sequences,
            actors,
            policy: WorkflowPolicy::default(),
            import: ImportSettings::default(),
            entries: DashMap::new(),
            journal: PostingJournal::new(),
            staged: DashMap::new(),
        }
    }

    /// Replaces the workflow policy.
    #[must_use]
    pub fn with_policy(mut self, policy: WorkflowPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the import settings.
    #[must_use]
    pub fn with_import_settings(mut self, settings: ImportSettings) -> Self {
        self.import = settings;
        self
    }

    /// The account directory.
    pub fn accounts(&self) -> &D {
        &self.accounts
    }

    /// The workflow policy.
    pub fn policy(&self) -> &WorkflowPolicy {
        &self.policy
    }

    /// The posting journal.
    pub fn journal(&self) -> &PostingJournal {
        &self.journal
    }

    fn actor(&self) -> Result<UserId, WorkflowError> {
        self.actors
            .current_actor_id()
            .ok_or(WorkflowError::ActorRequired)
    }

    fn snapshot(&self, id: EntryId) -> Result<Entry, WorkflowError> {
        self.entries
            .get(&id)
            .map(|entry| entry.clone())
            .ok_or(WorkflowError::EntryNotFound(id))
    }

    fn lost_race(id: EntryId, expected: u64, found: u64) -> WorkflowError {
        warn!(entry_id = %id, expected, found, "Entry changed concurrently");
        WorkflowError::ConcurrentModification(id)
    }

    // ========================================================================
    // Drafts
    // ========================================================================

    /// Creates a draft entry with the next sequence number for its kind.
    ///
    /// # Errors
    /// * `ActorRequired` if no actor is available
    /// * `Ledger` if the input lacks a date, narration or two lines
    pub fn create_draft(&self, input: NewEntry) -> Result<Entry, WorkflowError> {
        let actor = self.actor()?;
        let sequence = self.sequences.next_sequence_number(input.kind);
        let entry = Entry::create(input, sequence, actor)?;

        info!(
            entry_id = %entry.id(),
            sequence = %entry.sequence_number(),
            kind = %entry.kind(),
            "Draft created"
        );
        self.entries.insert(entry.id(), entry.clone());
        Ok(entry)
    }

    /// Applies an edit to a draft.
    ///
    /// The edit runs on a copy; the copy replaces the stored entry only if
    /// nobody changed it meanwhile. A failing edit leaves the entry untouched.
    ///
    /// # Errors
    /// * `EntryNotFound`, `ActorRequired`
    /// * `Ledger` if the entry is not a draft or the edit breaks a line rule
    /// * `ConcurrentModification` if the entry changed during the edit
    pub fn edit_draft<F>(&self, id: EntryId, edit: F) -> Result<Entry, WorkflowError>
    where
        F: FnOnce(&mut Entry) -> Result<(), LedgerError>,
    {
        self.actor()?;
        let mut draft = self.snapshot(id)?;
        let expected = draft.version();
        edit(&mut draft)?;

        let mut current = self
            .entries
            .get_mut(&id)
            .ok_or(WorkflowError::EntryNotFound(id))?;
        if current.version() != expected {
            return Err(Self::lost_race(id, expected, current.version()));
        }
        draft.bump_version();
        *current = draft;
        debug!(entry_id = %id, version = current.version(), "Draft updated");
        Ok(current.clone())
    }

    /// Replaces every line of a draft.
    ///
    /// # Errors
    /// Same as [`Self::edit_draft`].
    pub fn update_draft_lines(&self, id: EntryId, lines: Vec<Line>) -> Result<Entry, WorkflowError> {
        self.edit_draft(id, |entry| entry.replace_lines(lines))
    }

    /// Deletes a draft.
    ///
    /// # Errors
    /// * `EntryNotFound`, `ActorRequired`
    /// * `IllegalTransition` if the entry is not a draft
    pub fn delete_draft(&self, id: EntryId) -> Result<(), WorkflowError> {
        self.actor()?;
        let removed = self
            .entries
            .remove_if(&id, |_, entry| WorkflowService::ensure_deletable(entry).is_ok());
        if removed.is_some() {
            info!(entry_id = %id, "Draft deleted");
            return Ok(());
        }

        let entry = self
            .entries
            .get(&id)
            .ok_or(WorkflowError::EntryNotFound(id))?;
        WorkflowService::ensure_deletable(&entry)?;
        Err(WorkflowError::ConcurrentModification(id))
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    fn transition<F>(&self, id: EntryId, decide: F) -> Result<Entry, WorkflowError>
    where
        F: FnOnce(&Entry, UserId) -> Result<WorkflowAction, WorkflowError>,
    {
        let actor = self.actor()?;
        let snapshot = self.snapshot(id)?;
        let action = decide(&snapshot, actor)?;

        let mut entry = self
            .entries
            .get_mut(&id)
            .ok_or(WorkflowError::EntryNotFound(id))?;
        if entry.version() != snapshot.version() {
            return Err(Self::lost_race(id, snapshot.version(), entry.version()));
        }
        entry.apply(&action);
        entry.bump_version();
        if action.posts() {
            let appended = self.journal.append(&entry, action.occurred_at());
            debug!(entry_id = %id, postings = appended, "Postings appended");
        }

        info!(
            entry_id = %id,
            sequence = %entry.sequence_number(),
            status = %entry.status(),
            "Entry status changed"
        );
        Ok(entry.clone())
    }

    /// Submits a draft for approval.
    ///
    /// # Errors
    /// `Validation` if the entry does not balance, plus the usual transition errors.
    pub fn submit(&self, id: EntryId) -> Result<Entry, WorkflowError> {
        self.transition(id, |entry, actor| {
            WorkflowService::submit(entry, actor, &self.accounts)
        })
    }

    /// Approves a pending entry, posting it too when the policy says so for its kind.
    ///
    /// # Errors
    /// `Validation` if the entry does not balance, plus the usual transition errors.
    pub fn approve(&self, id: EntryId) -> Result<Entry, WorkflowError> {
        self.transition(id, |entry, actor| {
            let auto_post = self.policy.auto_posts(entry.kind());
            WorkflowService::approve(entry, actor, &self.accounts, auto_post)
        })
    }

    /// Rejects a pending entry.
    ///
    /// # Errors
    /// `RejectionReasonRequired` for a blank reason, plus the usual transition errors.
    pub fn reject(&self, id: EntryId, reason: &str) -> Result<Entry, WorkflowError> {
        self.transition(id, |entry, actor| {
            WorkflowService::reject(entry, actor, reason)
        })
    }

    /// Posts an approved entry.
    ///
    /// # Errors
    /// `Validation` if the entry does not balance, plus the usual transition errors.
    pub fn post(&self, id: EntryId) -> Result<Entry, WorkflowError> {
        self.transition(id, |entry, actor| {
            WorkflowService::post(entry, actor, &self.accounts)
        })
    }

    /// Cancels a draft or rejected entry.
    ///
    /// # Errors
    /// `CancellationReasonRequired` for a blank reason, plus the usual transition errors.
    pub fn cancel(&self, id: EntryId, reason: &str) -> Result<Entry, WorkflowError> {
        self.transition(id, |entry, actor| {
            WorkflowService::cancel(entry, actor, reason)
        })
    }

    /// Reverses a posted entry with a new, already posted, offsetting entry.
    ///
    /// The source's slot is held from the "not yet reversed" check until the
    /// link is written, so concurrent requests produce exactly one reversal.
    ///
    /// # Errors
    /// * `IllegalTransition` if the source is not posted
    /// * `AlreadyReversed`, `CannotReverseReversal`, `BackdatedReversal`
    /// * `EntryNotFound`, `ActorRequired`
    pub fn reverse(
        &self,
        id: EntryId,
        date: NaiveDate,
        reason: Option<String>,
    ) -> Result<Entry, WorkflowError> {
        let actor = self.actor()?;
        let request = ReversalRequest { date, reason };

        let reversal = {
            let mut source = self
                .entries
                .get_mut(&id)
                .ok_or(WorkflowError::EntryNotFound(id))?;
            let input = ReversalService::create_reversal(&source, &request, &self.policy)?;
            let sequence = self.sequences.next_sequence_number(input.kind);
            let mut reversal = Entry::create(input, sequence, actor)?;
            reversal.mark_reverses(id);

            let action = WorkflowService::post_reversal(&reversal, actor, &self.accounts)?;
            reversal.apply(&action);
            reversal.bump_version();
            let appended = self.journal.append(&reversal, action.occurred_at());
            debug!(entry_id = %reversal.id(), postings = appended, "Postings appended");

            source.link_reversal(reversal.id());
            source.bump_version();
            reversal
        };
        self.entries.insert(reversal.id(), reversal.clone());

        info!(
            entry_id = %id,
            reversal_id = %reversal.id(),
            sequence = %reversal.sequence_number(),
            "Entry reversed"
        );
        Ok(reversal)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Returns a copy of an entry.
    #[must_use]
    pub fn get(&self, id: EntryId) -> Option<Entry> {
        self.entries.get(&id).map(|entry| entry.clone())
    }

    /// Lists entries in creation order, optionally filtered by status.
    #[must_use]
    pub fn list(&self, status: Option<EntryStatus>) -> Vec<Entry> {
        let mut entries: Vec<Entry> = self
            .entries
            .iter()
            .filter(|entry| status.is_none_or(|s| entry.status() == s))
            .map(|entry| entry.clone())
            .collect();
        entries.sort_by(|a, b| {
            a.audit()
                .created_at
                .cmp(&b.audit().created_at)
                .then_with(|| a.sequence_number().cmp(b.sequence_number()))
        });
        entries
    }

    /// Balance of an account, folded from the posting journal.
    ///
    /// Returns `None` if the code does not resolve.
    #[must_use]
    pub fn account_balance(&self, code: &str) -> Option<AccountBalance> {
        let account = self.accounts.resolve_account(code)?;
        Some(
            self.journal
                .balance(&account.code, account.account_type.normal_balance()),
        )
    }

    /// Debit and credit totals across every posting.
    #[must_use]
    pub fn trial_balance(&self) -> TrialBalance {
        self.journal.trial_balance()
    }

    // ========================================================================
    // Batch import
    // ========================================================================

    /// Parses a delimited payload and stages its groups.
    ///
    /// # Errors
    /// Returns an error only if the payload as a whole cannot be read.
    pub fn import_csv(&self, text: &str) -> Result<ImportReport, ImportError> {
        let rows = read_rows(text, &self.import)?;
        Ok(self.import_batch(&rows))
    }

    /// Groups and validates rows, staging every group for commit.
    pub fn import_batch(&self, rows: &[ImportRow]) -> ImportReport {
        let (candidates, ungrouped) = group_rows(rows, &self.import);
        let groups = validate_candidates(candidates, &self.accounts, self.import.parallel);

        for group in &groups {
            if !group.valid {
                warn!(group = %group.key, errors = ?group.errors, "Import group rejected");
            }
            self.staged.insert(group.id, group.clone());
        }

        let report = ImportReport { groups, ungrouped };
        info!(
            rows = rows.len(),
            groups = report.groups.len(),
            valid = report.valid_count(),
            "Batch staged"
        );
        report
    }

    /// Returns a staged group.
    #[must_use]
    pub fn staged_group(&self, id: ImportGroupId) -> Option<GroupResult> {
        self.staged.get(&id).map(|group| group.clone())
    }

    /// Number of groups waiting in staging.
    #[must_use]
    pub fn staged_count(&self) -> usize {
        self.staged.len()
    }

    /// Drops staged groups without committing them.
    ///
    /// Returns how many of the ids were staged. Unknown ids are ignored.
    pub fn discard_batch(&self, group_ids: &[ImportGroupId]) -> usize {
        let discarded = group_ids
            .iter()
            .filter(|&&id| self.staged.remove(&id).is_some())
            .count();
        info!(requested = group_ids.len(), discarded, "Staged groups discarded");
        discarded
    }

    /// Creates one entry per requested valid group.
    ///
    /// Each group commits or fails on its own. Unknown, invalid and repeated
    /// ids count as failed. Committed groups leave the staging area.
    pub fn commit_batch(&self, group_ids: &[ImportGroupId]) -> CommitSummary {
        let mut summary = CommitSummary::default();
        let actor = self.actors.current_actor_id();

        for &group_id in group_ids {
            let Some(actor) = actor else {
                summary.record_failure(group_id, WorkflowError::ActorRequired.to_string());
                continue;
            };
            let Some((_, group)) = self.staged.remove_if(&group_id, |_, group| group.valid) else {
                let reason = if self.staged.contains_key(&group_id) {
                    "group has validation errors"
                } else {
                    "group is not staged"
                };
                summary.record_failure(group_id, reason);
                continue;
            };

            match self.commit_group(&group, actor) {
                Ok(entry) => summary.record_success(entry.id()),
                Err(err) => {
                    warn!(group = %group.key, error = %err, "Import group failed to commit");
                    summary.record_failure(group_id, err.to_string());
                    self.staged.insert(group_id, group);
                }
            }
        }

        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Batch committed"
        );
        summary
    }

    fn commit_group(&self, group: &GroupResult, actor: UserId) -> Result<Entry, WorkflowError> {
        let input = group.candidate().clone();
        validate_entry(&input, &self.accounts).map_err(WorkflowError::Validation)?;

        let sequence = self.sequences.next_sequence_number(input.kind);
        let mut entry = Entry::create(input, sequence, actor)?;
        if self.import.post_on_commit {
            let submit = WorkflowService::submit(&entry, actor, &self.accounts)?;
            entry.apply(&submit);
            entry.bump_version();
            let approve = WorkflowService::approve(&entry, actor, &self.accounts, true)?;
            entry.apply(&approve);
            entry.bump_version();
            self.journal.append(&entry, approve.occurred_at());
        }

        debug!(group = %group.key, entry_id = %entry.id(), status = %entry.status(), "Import group committed");
        self.entries.insert(entry.id(), entry.clone());
        Ok(entry)
    }

    /// Exports entries, optionally filtered by status, as an import payload.
    ///
    /// # Errors
    /// `InvalidDateFormat` if the import settings carry an unusable date format.
    pub fn export_entries(&self, status: Option<EntryStatus>) -> Result<String, ImportError> {
        pipeline::export_entries(&self.list(status), &self.import)
    }

    /// An empty import payload with the header row only.
    #[must_use]
    pub fn template(&self) -> String {
        pipeline::template(&self.import)
    }
}
