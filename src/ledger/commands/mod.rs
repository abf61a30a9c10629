//! Commands that mutate the entry store. Every command is atomic: either the
//! whole mutation commits or nothing does.

pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::domain::{
    entries::{Entry, EntryId},
    posting_month::PostingMonth,
};

/// The outcome of a committed transfer call.
#[derive(Clone, Debug, PartialEq)]
pub struct TransferReceipt {
    /// One parent posting per account pair, in grouping order.
    pub parents: Vec<Entry>,
    /// How many source entries were folded into parents.
    pub total_entries: usize,
    /// How many parent postings were created.
    pub total_groups: usize,
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("the general ledger description must be between 1 and 255 characters")]
    InvalidDescription,
    #[error("no entries were eligible for transfer")]
    NoEligibleEntries,
    #[error("unknown entry ids: {0:?}")]
    MissingEntries(Vec<EntryId>),
    #[error("one or more entries were transferred by a concurrent request; re-validate and retry")]
    ConcurrencyConflict,
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum RenameParentError {
    #[error("the general ledger description must be between 1 and 255 characters")]
    InvalidDescription,
    #[error("no parent general ledger entry found with the provided ID")]
    ParentNotFound,
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum RecordEntryError {
    #[error("no entry found with the provided ID")]
    EntryNotFound,
    #[error("the entry has already been transferred to the general ledger")]
    AlreadyTransferred,
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

#[async_trait]
pub trait TransferCommands {
    /// Fold the given entries into one parent posting per account pair under
    /// the target month.
    ///
    /// The caller passes ids it believes are eligible; eligibility is
    /// re-checked inside the store transaction so a concurrent transfer of
    /// any of the ids fails the whole call with
    /// [`TransferError::ConcurrencyConflict`] instead of double-transferring.
    async fn execute_transfer(
        &self,
        user_id: Uuid,
        entry_ids: &[EntryId],
        posting_month: PostingMonth,
        description: &str,
    ) -> Result<TransferReceipt, TransferError>;

    /// Replace the description of a parent posting. Amount, account pair,
    /// posting month, and children are never touched.
    async fn update_parent_description(
        &self,
        user_id: Uuid,
        parent_id: EntryId,
        description: &str,
    ) -> Result<Entry, RenameParentError>;

    /// Mark a draft entry as recorded. Recording an already recorded entry
    /// is a no-op; a transferred entry is rejected.
    async fn mark_recorded(&self, user_id: Uuid, entry_id: EntryId)
        -> Result<Entry, RecordEntryError>;

    /// Revert a recorded entry to draft. Only possible while the entry has
    /// not been transferred.
    async fn unmark_recorded(
        &self,
        user_id: Uuid,
        entry_id: EntryId,
    ) -> Result<Entry, RecordEntryError>;
}
