use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use super::{
    commands::{
        RecordEntryError, RenameParentError, TransferCommands, TransferError, TransferReceipt,
    },
    domain::{
        entries::{AccountId, Entry, EntryId},
        posting_month::PostingMonth,
        statement::{build_statement, GeneralLedgerStatement},
        transfer::{classify_eligibility, EligibilityReport},
    },
    queries::{AccountQueries, EntryQueries, TransferGroup},
};

pub type DynAccountQueries = Arc<dyn AccountQueries + Send + Sync>;
pub type DynEntryQueries = Arc<dyn EntryQueries + Send + Sync>;
pub type DynTransferCommands = Arc<dyn TransferCommands + Send + Sync>;

const MAX_DESCRIPTION_LENGTH: usize = 255;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("no account found with the provided ID")]
    AccountNotFound,
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("no transfer group found with the provided ID")]
    GroupNotFound,
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

/// Orchestrates the transfer engine, the statement builder, and the transfer
/// history reader over abstract store seams.
#[derive(Clone)]
pub struct GeneralLedgerService {
    accounts: DynAccountQueries,
    entries: DynEntryQueries,
    commands: DynTransferCommands,
}

impl GeneralLedgerService {
    pub fn new(
        accounts: DynAccountQueries,
        entries: DynEntryQueries,
        commands: DynTransferCommands,
    ) -> Self {
        Self {
            accounts,
            entries,
            commands,
        }
    }

    /// Classify a batch of candidate entry ids without mutating anything.
    pub async fn validate_transfer(
        &self,
        user_id: Uuid,
        entry_ids: &[EntryId],
    ) -> anyhow::Result<EligibilityReport> {
        let statuses = self.entries.entry_statuses(user_id, entry_ids).await?;

        Ok(classify_eligibility(entry_ids, &statuses))
    }

    /// Fold the eligible entries among `entry_ids` into one parent posting
    /// per account pair under `posting_month`.
    ///
    /// Ineligible entries are skipped; unknown ids or a batch without a
    /// single eligible entry abort the call before any side effect.
    pub async fn transfer(
        &self,
        user_id: Uuid,
        entry_ids: &[EntryId],
        posting_month: PostingMonth,
        description: &str,
    ) -> Result<TransferReceipt, TransferError> {
        let description =
            clean_description(description).ok_or(TransferError::InvalidDescription)?;

        let report = self.validate_transfer(user_id, entry_ids).await?;
        if !report.missing.is_empty() {
            return Err(TransferError::MissingEntries(report.missing));
        }
        if report.eligible.is_empty() {
            return Err(TransferError::NoEligibleEntries);
        }

        self.commands
            .execute_transfer(user_id, &report.eligible, posting_month, description)
            .await
    }

    /// The month-bucketed statement for an account between two dates. A pure
    /// function of store state.
    pub async fn general_ledger_view(
        &self,
        user_id: Uuid,
        account_id: AccountId,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<GeneralLedgerStatement, ViewError> {
        let account = self
            .accounts
            .get_account(account_id)
            .await?
            .ok_or(ViewError::AccountNotFound)?;

        let opening_balance = self
            .entries
            .opening_balance(user_id, account_id, date_from)
            .await?;

        let postings = if date_from <= date_to {
            self.entries
                .parent_postings(
                    user_id,
                    account_id,
                    PostingMonth::containing(date_from),
                    PostingMonth::containing(date_to),
                )
                .await?
        } else {
            Vec::new()
        };

        Ok(build_statement(
            account,
            date_from,
            date_to,
            opening_balance,
            postings,
        ))
    }

    /// One transfer group by parent id, or the whole catalog when no id is
    /// given.
    pub async fn transfer_history(
        &self,
        user_id: Uuid,
        transfer_group_id: Option<EntryId>,
    ) -> Result<Vec<TransferGroup>, HistoryError> {
        match transfer_group_id {
            Some(parent_id) => self
                .entries
                .transfer_group(user_id, parent_id)
                .await?
                .map(|group| vec![group])
                .ok_or(HistoryError::GroupNotFound),
            None => Ok(self.entries.transfer_catalog(user_id).await?),
        }
    }

    /// Replace a parent posting's description.
    pub async fn rename_parent(
        &self,
        user_id: Uuid,
        parent_id: EntryId,
        description: &str,
    ) -> Result<Entry, RenameParentError> {
        let description =
            clean_description(description).ok_or(RenameParentError::InvalidDescription)?;

        self.commands
            .update_parent_description(user_id, parent_id, description)
            .await
    }

    pub async fn record_entry(
        &self,
        user_id: Uuid,
        entry_id: EntryId,
    ) -> Result<Entry, RecordEntryError> {
        self.commands.mark_recorded(user_id, entry_id).await
    }

    pub async fn unrecord_entry(
        &self,
        user_id: Uuid,
        entry_id: EntryId,
    ) -> Result<Entry, RecordEntryError> {
        self.commands.unmark_recorded(user_id, entry_id).await
    }
}

fn clean_description(description: &str) -> Option<&str> {
    let trimmed = description.trim();

    if trimmed.is_empty() || trimmed.chars().count() > MAX_DESCRIPTION_LENGTH {
        None
    } else {
        Some(trimmed)
    }
}
