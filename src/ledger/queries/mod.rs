//! Queries for general ledger information.
//!
//! Queries fetch information from whatever storage is backing the
//! application. They never modify data.

pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use super::domain::{
    entries::{Account, AccountId, Category, Entry, EntryId},
    posting_month::PostingMonth,
    statement::PostingRow,
    transfer::EntryStatus,
};

/// Read-only access to the chart of accounts. The directory is consumed,
/// not owned, by the ledger engine.
#[async_trait]
pub trait AccountQueries {
    async fn get_account(&self, account_id: AccountId) -> Result<Option<Account>>;
}

/// An entry with its related accounts and category preloaded.
#[derive(Clone, Debug, PartialEq)]
pub struct EntryWithAccounts {
    pub entry: Entry,
    pub debit_account: Account,
    pub credit_account: Account,
    pub category: Option<Category>,
}

/// A parent general ledger posting together with the children folded into it.
#[derive(Clone, Debug, PartialEq)]
pub struct TransferGroup {
    pub parent: EntryWithAccounts,
    pub children: Vec<EntryWithAccounts>,
}

#[async_trait]
pub trait EntryQueries {
    /// Fetch the lifecycle markers for a batch of entry ids owned by the
    /// given user. Ids that do not exist under that user are simply absent
    /// from the result.
    async fn entry_statuses(
        &self,
        user_id: Uuid,
        entry_ids: &[EntryId],
    ) -> Result<Vec<EntryStatus>>;

    /// The account's net history (debits minus credits) strictly before
    /// `before`, in minor currency units.
    ///
    /// Recorded leaf entries count by transaction date while they remain
    /// untransferred; once transferred they are represented solely by their
    /// parent posting, which counts by creation date.
    async fn opening_balance(
        &self,
        user_id: Uuid,
        account_id: AccountId,
        before: NaiveDate,
    ) -> Result<i64>;

    /// Parent postings touching the account with a posting month inside the
    /// inclusive range, counterpart account preloaded.
    async fn parent_postings(
        &self,
        user_id: Uuid,
        account_id: AccountId,
        first_month: PostingMonth,
        last_month: PostingMonth,
    ) -> Result<Vec<PostingRow>>;

    /// A single transfer group by its parent entry id.
    async fn transfer_group(
        &self,
        user_id: Uuid,
        parent_id: EntryId,
    ) -> Result<Option<TransferGroup>>;

    /// Every transfer group for the user, newest parent first.
    async fn transfer_catalog(&self, user_id: Uuid) -> Result<Vec<TransferGroup>>;
}
