use anyhow::Context;
use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    database::PostgresConnection,
    ledger::domain::{
        entries::{Entry, EntryId},
        posting_month::PostingMonth,
        transfer::{group_by_account_pair, SourceEntry},
    },
    models::ledger::EntryRow,
};

use super::{
    RecordEntryError, RenameParentError, TransferCommands, TransferError, TransferReceipt,
};

pub struct PostgresCommands(pub PostgresConnection);

#[derive(sqlx::FromRow)]
struct LockedSourceRow {
    id: i64,
    amount: i64,
    debit_account_id: i32,
    credit_account_id: i32,
}

#[async_trait]
impl TransferCommands for PostgresCommands {
    async fn execute_transfer(
        &self,
        user_id: Uuid,
        entry_ids: &[EntryId],
        posting_month: PostingMonth,
        description: &str,
    ) -> Result<TransferReceipt, TransferError> {
        let mut tx = self.0.begin().await.map_err(anyhow::Error::from)?;

        // Lock the source rows and re-check eligibility inside the
        // transaction. A concurrent transfer that won the race shrinks this
        // result set, which fails the whole call instead of double
        // transferring.
        let locked = sqlx::query_as::<_, LockedSourceRow>(
            r#"
            SELECT id, amount, debit_account_id, credit_account_id
            FROM entry
            WHERE user_id = $1
                AND id = ANY($2)
                AND recorded_at IS NOT NULL
                AND transferred_to_gl_at IS NULL
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .bind(entry_ids.to_vec())
        .fetch_all(&mut tx)
        .await
        .map_err(anyhow::Error::from)?;

        if locked.is_empty() {
            return Err(TransferError::NoEligibleEntries);
        }
        if locked.len() != entry_ids.len() {
            debug!(
                requested = entry_ids.len(),
                lockable = locked.len(),
                "Entries lost eligibility between validation and commit."
            );

            return Err(TransferError::ConcurrencyConflict);
        }

        let sources: Vec<SourceEntry> = locked
            .iter()
            .map(|row| SourceEntry {
                id: row.id,
                amount: row.amount,
                debit_account_id: row.debit_account_id,
                credit_account_id: row.credit_account_id,
            })
            .collect();
        let groups = group_by_account_pair(&sources);

        let mut parents = Vec::with_capacity(groups.len());

        for group in &groups {
            let parent_row = sqlx::query_as::<_, EntryRow>(
                r#"
                INSERT INTO entry (
                    user_id, amount, description, transaction_date, book_type,
                    debit_account_id, credit_account_id, recorded_at,
                    gl_posting_month
                )
                VALUES ($1, $2, $3, $4, 'general_ledger', $5, $6, now(), $7)
                RETURNING *
                "#,
            )
            .bind(user_id)
            .bind(group.total_amount)
            .bind(description)
            .bind(posting_month.first_day())
            .bind(group.pair.debit_account_id)
            .bind(group.pair.credit_account_id)
            .bind(posting_month.to_string())
            .fetch_one(&mut tx)
            .await
            .map_err(anyhow::Error::from)?;

            let reparented = sqlx::query(
                r#"
                UPDATE entry
                SET gl_parent_id = $1,
                    transferred_to_gl_at = now(),
                    gl_posting_month = $2
                WHERE id = ANY($3) AND transferred_to_gl_at IS NULL
                "#,
            )
            .bind(parent_row.id)
            .bind(posting_month.to_string())
            .bind(group.entry_ids.clone())
            .execute(&mut tx)
            .await
            .map_err(anyhow::Error::from)?;

            // Dropping the transaction rolls back the parent created above,
            // so a lost race never leaves a dangling parent.
            if reparented.rows_affected() != group.entry_ids.len() as u64 {
                return Err(TransferError::ConcurrencyConflict);
            }

            parents.push(
                Entry::try_from(parent_row)
                    .context("Failed to convert parent entry row into domain object.")?,
            );
        }

        tx.commit().await.map_err(anyhow::Error::from)?;

        info!(
            %user_id,
            %posting_month,
            total_entries = sources.len(),
            total_groups = groups.len(),
            "Transferred entries to the general ledger."
        );

        Ok(TransferReceipt {
            total_entries: sources.len(),
            total_groups: groups.len(),
            parents,
        })
    }

    async fn update_parent_description(
        &self,
        user_id: Uuid,
        parent_id: EntryId,
        description: &str,
    ) -> Result<Entry, RenameParentError> {
        let updated = sqlx::query_as::<_, EntryRow>(
            r#"
            UPDATE entry
            SET description = $1
            WHERE id = $2
                AND user_id = $3
                AND book_type = 'general_ledger'
                AND gl_parent_id IS NULL
            RETURNING *
            "#,
        )
        .bind(description)
        .bind(parent_id)
        .bind(user_id)
        .fetch_optional(&*self.0)
        .await
        .map_err(anyhow::Error::from)?
        .ok_or(RenameParentError::ParentNotFound)?;

        info!(%parent_id, "Updated parent posting description.");

        Ok(Entry::try_from(updated)
            .context("Failed to convert parent entry row into domain object.")?)
    }

    async fn mark_recorded(
        &self,
        user_id: Uuid,
        entry_id: EntryId,
    ) -> Result<Entry, RecordEntryError> {
        let updated = sqlx::query_as::<_, EntryRow>(
            r#"
            UPDATE entry
            SET recorded_at = COALESCE(recorded_at, now())
            WHERE id = $1
                AND user_id = $2
                AND transferred_to_gl_at IS NULL
                AND book_type <> 'general_ledger'
            RETURNING *
            "#,
        )
        .bind(entry_id)
        .bind(user_id)
        .fetch_optional(&*self.0)
        .await
        .map_err(anyhow::Error::from)?;

        match updated {
            Some(row) => {
                info!(%entry_id, "Marked entry as recorded.");

                Ok(Entry::try_from(row)
                    .context("Failed to convert entry row into domain object.")?)
            }
            None => Err(self.explain_record_failure(user_id, entry_id).await?),
        }
    }

    async fn unmark_recorded(
        &self,
        user_id: Uuid,
        entry_id: EntryId,
    ) -> Result<Entry, RecordEntryError> {
        let updated = sqlx::query_as::<_, EntryRow>(
            r#"
            UPDATE entry
            SET recorded_at = NULL
            WHERE id = $1
                AND user_id = $2
                AND transferred_to_gl_at IS NULL
                AND book_type <> 'general_ledger'
            RETURNING *
            "#,
        )
        .bind(entry_id)
        .bind(user_id)
        .fetch_optional(&*self.0)
        .await
        .map_err(anyhow::Error::from)?;

        match updated {
            Some(row) => {
                info!(%entry_id, "Reverted entry to draft.");

                Ok(Entry::try_from(row)
                    .context("Failed to convert entry row into domain object.")?)
            }
            None => Err(self.explain_record_failure(user_id, entry_id).await?),
        }
    }
}

impl PostgresCommands {
    /// Work out why a record/unrecord update matched no rows. A transferred
    /// leaf is reported as such; parents and unknown ids are not found.
    async fn explain_record_failure(
        &self,
        user_id: Uuid,
        entry_id: EntryId,
    ) -> Result<RecordEntryError, RecordEntryError> {
        let transferred = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT transferred_to_gl_at IS NOT NULL
            FROM entry
            WHERE id = $1 AND user_id = $2 AND book_type <> 'general_ledger'
            "#,
        )
        .bind(entry_id)
        .bind(user_id)
        .fetch_optional(&*self.0)
        .await
        .map_err(anyhow::Error::from)?;

        Ok(match transferred {
            Some(true) => RecordEntryError::AlreadyTransferred,
            _ => RecordEntryError::EntryNotFound,
        })
    }
}
