use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::{
    database::PostgresConnection,
    ledger::domain::{
        entries::{Account, AccountId, EntryId},
        posting_month::PostingMonth,
        statement::PostingRow,
        transfer::EntryStatus,
    },
    models::ledger::{collate_transfer_groups, AccountRow, CategoryRow, EntryRow, EntryStatusRow,
        PostingRecord},
};

use super::{AccountQueries, EntryQueries, TransferGroup};

/// A struct to provide queries for the Postgres database backing the
/// application.
pub struct PostgresQueries(pub PostgresConnection);

#[async_trait]
impl AccountQueries for PostgresQueries {
    async fn get_account(&self, account_id: AccountId) -> Result<Option<Account>> {
        trace!(%account_id, "Fetching account from the directory.");

        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, code, name, kind
            FROM account
            WHERE id = $1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&*self.0)
        .await?;

        Ok(row.map(Account::try_from).transpose()?)
    }
}

#[async_trait]
impl EntryQueries for PostgresQueries {
    async fn entry_statuses(
        &self,
        user_id: Uuid,
        entry_ids: &[EntryId],
    ) -> Result<Vec<EntryStatus>> {
        trace!(%user_id, count = entry_ids.len(), "Fetching entry statuses.");

        let rows = sqlx::query_as::<_, EntryStatusRow>(
            r#"
            SELECT id, recorded_at, transferred_to_gl_at
            FROM entry
            WHERE user_id = $1 AND id = ANY($2)
            "#,
        )
        .bind(user_id)
        .bind(entry_ids.to_vec())
        .fetch_all(&*self.0)
        .await?;

        Ok(rows.into_iter().map(EntryStatus::from).collect())
    }

    async fn opening_balance(
        &self,
        user_id: Uuid,
        account_id: AccountId,
        before: NaiveDate,
    ) -> Result<i64> {
        trace!(%user_id, %account_id, %before, "Computing opening balance.");

        // Untransferred leaves count by transaction date; transferred leaves
        // are represented solely by their parent posting, which counts by
        // creation date.
        let balance = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(
                CASE WHEN debit_account_id = $2 THEN amount ELSE -amount END
            ), 0)::BIGINT
            FROM entry
            WHERE user_id = $1
                AND (debit_account_id = $2 OR credit_account_id = $2)
                AND (
                    (
                        gl_parent_id IS NULL
                        AND book_type <> 'general_ledger'
                        AND recorded_at IS NOT NULL
                        AND transferred_to_gl_at IS NULL
                        AND transaction_date < $3
                    )
                    OR
                    (
                        gl_parent_id IS NULL
                        AND book_type = 'general_ledger'
                        AND created_at::date < $3
                    )
                )
            "#,
        )
        .bind(user_id)
        .bind(account_id)
        .bind(before)
        .fetch_one(&*self.0)
        .await?;

        Ok(balance)
    }

    async fn parent_postings(
        &self,
        user_id: Uuid,
        account_id: AccountId,
        first_month: PostingMonth,
        last_month: PostingMonth,
    ) -> Result<Vec<PostingRow>> {
        trace!(
            %user_id,
            %account_id,
            %first_month,
            %last_month,
            "Fetching parent postings for statement."
        );

        // The YYYY-MM representation sorts lexically in chronological order,
        // so the month range is a plain string comparison.
        let records = sqlx::query_as::<_, PostingRecord>(
            r#"
            SELECT
                e.id, e.transaction_date, e.description, e.amount,
                e.debit_account_id, e.credit_account_id, e.gl_posting_month,
                a.code AS counterpart_code, a.name AS counterpart_name
            FROM entry e
                JOIN account a ON a.id = CASE
                    WHEN e.debit_account_id = $2 THEN e.credit_account_id
                    ELSE e.debit_account_id
                END
            WHERE e.user_id = $1
                AND e.book_type = 'general_ledger'
                AND e.gl_parent_id IS NULL
                AND (e.debit_account_id = $2 OR e.credit_account_id = $2)
                AND e.gl_posting_month >= $3
                AND e.gl_posting_month <= $4
            ORDER BY e.gl_posting_month, e.transaction_date, e.id
            "#,
        )
        .bind(user_id)
        .bind(account_id)
        .bind(first_month.to_string())
        .bind(last_month.to_string())
        .fetch_all(&*self.0)
        .await?;

        Ok(records
            .into_iter()
            .map(PostingRow::try_from)
            .collect::<Result<_, _>>()?)
    }

    async fn transfer_group(
        &self,
        user_id: Uuid,
        parent_id: EntryId,
    ) -> Result<Option<TransferGroup>> {
        trace!(%user_id, %parent_id, "Querying for transfer group by parent ID.");

        let parent = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT *
            FROM entry
            WHERE user_id = $1
                AND id = $2
                AND book_type = 'general_ledger'
                AND gl_parent_id IS NULL
            "#,
        )
        .bind(user_id)
        .bind(parent_id)
        .fetch_optional(&*self.0)
        .await?;

        let parent = match parent {
            Some(row) => row,
            None => {
                debug!(%user_id, %parent_id, "Transfer group does not exist.");

                return Ok(None);
            }
        };

        let children = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT *
            FROM entry
            WHERE gl_parent_id = $1
            ORDER BY id
            "#,
        )
        .bind(parent_id)
        .fetch_all(&*self.0)
        .await?;

        let mut groups = self.collate(vec![parent], children).await?;

        Ok(groups.pop())
    }

    async fn transfer_catalog(&self, user_id: Uuid) -> Result<Vec<TransferGroup>> {
        trace!(%user_id, "Listing all transfer groups.");

        let parents = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT *
            FROM entry
            WHERE user_id = $1
                AND book_type = 'general_ledger'
                AND gl_parent_id IS NULL
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&*self.0)
        .await?;

        let parent_ids: Vec<EntryId> = parents.iter().map(|parent| parent.id).collect();

        let children = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT *
            FROM entry
            WHERE gl_parent_id = ANY($1)
            ORDER BY gl_parent_id, id
            "#,
        )
        .bind(parent_ids)
        .fetch_all(&*self.0)
        .await?;

        self.collate(parents, children).await
    }
}

impl PostgresQueries {
    /// Load the accounts and categories referenced by the given rows and
    /// assemble the full transfer groups.
    async fn collate(
        &self,
        parents: Vec<EntryRow>,
        children: Vec<EntryRow>,
    ) -> Result<Vec<TransferGroup>> {
        let mut account_ids: Vec<i32> = parents
            .iter()
            .chain(children.iter())
            .flat_map(|row| [row.debit_account_id, row.credit_account_id])
            .collect();
        account_ids.sort_unstable();
        account_ids.dedup();

        let mut category_ids: Vec<i32> = children
            .iter()
            .filter_map(|row| row.category_id)
            .collect();
        category_ids.sort_unstable();
        category_ids.dedup();

        let accounts = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, code, name, kind
            FROM account
            WHERE id = ANY($1)
            "#,
        )
        .bind(account_ids)
        .fetch_all(&*self.0)
        .await?;

        let categories = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT id, name
            FROM category
            WHERE id = ANY($1)
            "#,
        )
        .bind(category_ids)
        .fetch_all(&*self.0)
        .await?;

        Ok(collate_transfer_groups(
            parents, children, accounts, categories,
        )?)
    }
}
