//! Row models for the polymorphic entry table and its related tables, plus
//! the collation that reassembles rows into domain read models.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::ledger::{
    domain::{
        entries::{
            Account, AccountId, AccountKindParseError, BookTypeParseError, Category, CategoryId,
            Entry, EntryId, VatClassParseError,
        },
        posting_month::PostingMonthParseError,
        statement::PostingRow,
        transfer::EntryStatus,
    },
    queries::{EntryWithAccounts, TransferGroup},
};

/// An entry as stored. Leaf and parent rows share this shape; enums and the
/// posting month are persisted as text and parsed during collation.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct EntryRow {
    pub id: i64,
    pub user_id: Uuid,
    pub amount: i64,
    pub description: String,
    pub transaction_date: NaiveDate,
    pub book_type: String,
    pub reference: Option<String>,
    pub vat_class: Option<String>,
    pub debit_account_id: i32,
    pub credit_account_id: i32,
    pub category_id: Option<i32>,
    pub recorded_at: Option<DateTime<Utc>>,
    pub transferred_to_gl_at: Option<DateTime<Utc>>,
    pub gl_parent_id: Option<i64>,
    pub gl_posting_month: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct AccountRow {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub kind: String,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i32,
    pub name: String,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct EntryStatusRow {
    pub id: i64,
    pub recorded_at: Option<DateTime<Utc>>,
    pub transferred_to_gl_at: Option<DateTime<Utc>>,
}

/// A parent posting joined with its counterpart account for the statement
/// view.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct PostingRecord {
    pub id: i64,
    pub transaction_date: NaiveDate,
    pub description: String,
    pub amount: i64,
    pub debit_account_id: i32,
    pub credit_account_id: i32,
    pub gl_posting_month: String,
    pub counterpart_code: String,
    pub counterpart_name: String,
}

#[derive(Debug, Error)]
pub enum EntryCollationError {
    #[error(transparent)]
    BadBookType(#[from] BookTypeParseError),
    #[error(transparent)]
    BadVatClass(#[from] VatClassParseError),
    #[error(transparent)]
    BadPostingMonth(#[from] PostingMonthParseError),
    #[error(transparent)]
    BadAccountKind(#[from] AccountKindParseError),
    #[error("the entry references account ID {0} which is not present")]
    UnmatchedAccount(AccountId),
    #[error("the entry references category ID {0} which is not present")]
    UnmatchedCategory(CategoryId),
}

impl TryFrom<EntryRow> for Entry {
    type Error = EntryCollationError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            amount: row.amount,
            description: row.description,
            transaction_date: row.transaction_date,
            book_type: row.book_type.parse()?,
            reference: row.reference,
            vat_class: row.vat_class.as_deref().map(str::parse).transpose()?,
            debit_account_id: row.debit_account_id,
            credit_account_id: row.credit_account_id,
            category_id: row.category_id,
            recorded_at: row.recorded_at,
            transferred_to_gl_at: row.transferred_to_gl_at,
            gl_parent_id: row.gl_parent_id,
            gl_posting_month: row
                .gl_posting_month
                .as_deref()
                .map(str::parse)
                .transpose()?,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<AccountRow> for Account {
    type Error = EntryCollationError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            code: row.code,
            name: row.name,
            kind: row.kind.parse()?,
        })
    }
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

impl From<EntryStatusRow> for EntryStatus {
    fn from(row: EntryStatusRow) -> Self {
        Self {
            id: row.id,
            recorded_at: row.recorded_at,
            transferred_to_gl_at: row.transferred_to_gl_at,
        }
    }
}

impl TryFrom<PostingRecord> for PostingRow {
    type Error = EntryCollationError;

    fn try_from(record: PostingRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            entry_id: record.id,
            date: record.transaction_date,
            description: record.description,
            amount: record.amount,
            debit_account_id: record.debit_account_id,
            credit_account_id: record.credit_account_id,
            counterpart_code: record.counterpart_code,
            counterpart_name: record.counterpart_name,
            posting_month: record.gl_posting_month.parse()?,
        })
    }
}

/// Reassemble parent and child rows into transfer groups, attaching the
/// referenced accounts and categories. Parents keep their input order;
/// children are grouped under their parent id.
pub fn collate_transfer_groups<P, C, A, K>(
    parents: P,
    children: C,
    accounts: A,
    categories: K,
) -> Result<Vec<TransferGroup>, EntryCollationError>
where
    P: IntoIterator<Item = EntryRow>,
    C: IntoIterator<Item = EntryRow>,
    A: IntoIterator<Item = AccountRow>,
    K: IntoIterator<Item = CategoryRow>,
{
    let mut accounts_by_id: HashMap<AccountId, Account> = HashMap::new();
    for row in accounts {
        accounts_by_id.insert(row.id, row.try_into()?);
    }

    let categories_by_id: HashMap<CategoryId, Category> = categories
        .into_iter()
        .map(|row| (row.id, row.into()))
        .collect();

    let attach = |row: EntryRow| -> Result<EntryWithAccounts, EntryCollationError> {
        let entry: Entry = row.try_into()?;

        let debit_account = accounts_by_id
            .get(&entry.debit_account_id)
            .cloned()
            .ok_or(EntryCollationError::UnmatchedAccount(entry.debit_account_id))?;
        let credit_account = accounts_by_id
            .get(&entry.credit_account_id)
            .cloned()
            .ok_or(EntryCollationError::UnmatchedAccount(
                entry.credit_account_id,
            ))?;
        let category = entry
            .category_id
            .map(|category_id| {
                categories_by_id
                    .get(&category_id)
                    .cloned()
                    .ok_or(EntryCollationError::UnmatchedCategory(category_id))
            })
            .transpose()?;

        Ok(EntryWithAccounts {
            entry,
            debit_account,
            credit_account,
            category,
        })
    };

    let mut children_by_parent: HashMap<EntryId, Vec<EntryWithAccounts>> = HashMap::new();
    for row in children {
        let parent_id = row.gl_parent_id;
        let child = attach(row)?;

        if let Some(parent_id) = parent_id {
            children_by_parent.entry(parent_id).or_default().push(child);
        }
    }

    parents
        .into_iter()
        .map(|row| {
            let parent_id = row.id;
            let parent = attach(row)?;

            Ok(TransferGroup {
                parent,
                children: children_by_parent.remove(&parent_id).unwrap_or_default(),
            })
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn account_row(id: i32, code: &str) -> AccountRow {
        AccountRow {
            id,
            code: code.to_owned(),
            name: format!("Account {code}"),
            kind: "asset".to_owned(),
        }
    }

    fn entry_row(id: i64, book_type: &str, gl_parent_id: Option<i64>) -> EntryRow {
        EntryRow {
            id,
            user_id: Uuid::new_v4(),
            amount: 1_000,
            description: "Entry".to_owned(),
            transaction_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            book_type: book_type.to_owned(),
            reference: None,
            vat_class: None,
            debit_account_id: 101,
            credit_account_id: 401,
            category_id: None,
            recorded_at: None,
            transferred_to_gl_at: None,
            gl_parent_id,
            gl_posting_month: Some("2024-03".to_owned()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn collation_attaches_children_to_their_parent() {
        let groups = collate_transfer_groups(
            vec![entry_row(1, "general_ledger", None)],
            vec![
                entry_row(2, "cash_receipt", Some(1)),
                entry_row(3, "cash_receipt", Some(1)),
            ],
            vec![account_row(101, "101"), account_row(401, "401")],
            Vec::new(),
        )
        .expect("collation failed");

        assert_eq!(1, groups.len());
        assert_eq!(1, groups[0].parent.entry.id);
        assert_eq!(2, groups[0].children.len());
        assert_eq!("101", groups[0].parent.debit_account.code);
    }

    #[test]
    fn collation_fails_on_unknown_account_reference() {
        let error = collate_transfer_groups(
            vec![entry_row(1, "general_ledger", None)],
            Vec::new(),
            vec![account_row(101, "101")],
            Vec::new(),
        )
        .expect_err("missing credit account should fail collation");

        assert!(matches!(
            error,
            EntryCollationError::UnmatchedAccount(401)
        ));
    }

    #[test]
    fn collation_rejects_unknown_book_type() {
        let result = collate_transfer_groups(
            vec![entry_row(1, "scribbles", None)],
            Vec::new(),
            vec![account_row(101, "101"), account_row(401, "401")],
            Vec::new(),
        );

        assert!(matches!(result, Err(EntryCollationError::BadBookType(_))));
    }
}
