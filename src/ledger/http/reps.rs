//! JSON representations for the general ledger API. Field names follow the
//! camelCase convention of the web client.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::{
    domain::{
        entries::{Account, AccountId, Category, CategoryId, Entry, EntryId},
        posting_month::PostingMonth,
        statement::{
            Balance, GeneralLedgerStatement, MonthSection, Side, StatementLine,
        },
        transfer::EligibilityReport,
    },
    queries::{EntryWithAccounts, TransferGroup},
};

use super::super::commands::TransferReceipt;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub transaction_ids: Vec<EntryId>,
    pub target_month: PostingMonth,
    pub gl_description: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateTransferRequest {
    pub transaction_ids: Vec<EntryId>,
}

#[derive(Deserialize)]
pub struct UpdateDescriptionRequest {
    pub description: String,
}

#[derive(Serialize)]
pub struct IneligibleTransaction {
    pub id: EntryId,
    pub reason: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub eligible_transactions: Vec<EntryId>,
    pub ineligible_transactions: Vec<IneligibleTransaction>,
    pub errors: Vec<String>,
    /// Always present for the client, currently never populated.
    pub warnings: Vec<String>,
}

impl From<EligibilityReport> for ValidationResult {
    fn from(report: EligibilityReport) -> Self {
        Self {
            is_valid: report.is_valid(),
            errors: report
                .missing
                .iter()
                .map(|id| format!("No entry found with ID {id}."))
                .collect(),
            eligible_transactions: report.eligible,
            ineligible_transactions: report
                .ineligible
                .into_iter()
                .map(|entry| IneligibleTransaction {
                    id: entry.id,
                    reason: entry.reason,
                })
                .collect(),
            warnings: Vec::new(),
        }
    }
}

/// An entry without its related records preloaded, as returned by the
/// mutating endpoints.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySummary {
    pub id: EntryId,
    pub amount: i64,
    pub description: String,
    pub transaction_date: NaiveDate,
    pub book_type: String,
    pub debit_account_id: AccountId,
    pub credit_account_id: AccountId,
    pub recorded_at: Option<DateTime<Utc>>,
    pub transferred_to_gl_at: Option<DateTime<Utc>>,
    pub gl_posting_month: Option<PostingMonth>,
    pub created_at: DateTime<Utc>,
}

impl From<&Entry> for EntrySummary {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.id,
            amount: entry.amount,
            description: entry.description.clone(),
            transaction_date: entry.transaction_date,
            book_type: entry.book_type.as_str().to_owned(),
            debit_account_id: entry.debit_account_id,
            credit_account_id: entry.credit_account_id,
            recorded_at: entry.recorded_at,
            transferred_to_gl_at: entry.transferred_to_gl_at,
            gl_posting_month: entry.gl_posting_month,
            created_at: entry.created_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSuccess {
    pub status: &'static str,
    pub parent_entries: Vec<EntrySummary>,
    pub total_entries: usize,
    pub total_groups: usize,
}

impl From<TransferReceipt> for TransferSuccess {
    fn from(receipt: TransferReceipt) -> Self {
        Self {
            status: "success",
            parent_entries: receipt.parents.iter().map(EntrySummary::from).collect(),
            total_entries: receipt.total_entries,
            total_groups: receipt.total_groups,
        }
    }
}

#[derive(Serialize)]
pub struct AccountRep {
    pub id: AccountId,
    pub code: String,
    pub name: String,
    pub kind: String,
}

impl From<&Account> for AccountRep {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            code: account.code.clone(),
            name: account.name.clone(),
            kind: account.kind.as_str().to_owned(),
        }
    }
}

#[derive(Serialize)]
pub struct CategoryRep {
    pub id: CategoryId,
    pub name: String,
}

impl From<&Category> for CategoryRep {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
        }
    }
}

/// An entry with its related accounts and category, as rendered in the
/// transfer history. The VAT portion is derived, never stored.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDetail {
    pub id: EntryId,
    pub amount: i64,
    pub vat_amount: i64,
    pub description: String,
    pub transaction_date: NaiveDate,
    pub book_type: String,
    pub reference: Option<String>,
    pub vat_class: Option<String>,
    pub debit_account: AccountRep,
    pub credit_account: AccountRep,
    pub category: Option<CategoryRep>,
    pub recorded_at: Option<DateTime<Utc>>,
    pub transferred_to_gl_at: Option<DateTime<Utc>>,
    pub gl_parent_id: Option<EntryId>,
    pub gl_posting_month: Option<PostingMonth>,
    pub created_at: DateTime<Utc>,
}

impl From<&EntryWithAccounts> for EntryDetail {
    fn from(loaded: &EntryWithAccounts) -> Self {
        let entry = &loaded.entry;

        Self {
            id: entry.id,
            amount: entry.amount,
            vat_amount: entry.vat_amount(),
            description: entry.description.clone(),
            transaction_date: entry.transaction_date,
            book_type: entry.book_type.as_str().to_owned(),
            reference: entry.reference.clone(),
            vat_class: entry.vat_class.map(|class| class.as_str().to_owned()),
            debit_account: (&loaded.debit_account).into(),
            credit_account: (&loaded.credit_account).into(),
            category: loaded.category.as_ref().map(CategoryRep::from),
            recorded_at: entry.recorded_at,
            transferred_to_gl_at: entry.transferred_to_gl_at,
            gl_parent_id: entry.gl_parent_id,
            gl_posting_month: entry.gl_posting_month,
            created_at: entry.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct TransferGroupRep {
    pub parent: EntryDetail,
    pub children: Vec<EntryDetail>,
}

impl From<&TransferGroup> for TransferGroupRep {
    fn from(group: &TransferGroup) -> Self {
        Self {
            parent: (&group.parent).into(),
            children: group.children.iter().map(EntryDetail::from).collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceRep {
    pub balance_type: &'static str,
    pub amount: i64,
}

impl From<Balance> for BalanceRep {
    fn from(balance: Balance) -> Self {
        Self {
            balance_type: side_name(balance.balance_type),
            amount: balance.amount,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementLineRep {
    pub entry_id: EntryId,
    pub date: NaiveDate,
    pub description: String,
    pub counterpart_code: String,
    pub counterpart_name: String,
    pub side: &'static str,
    pub amount: i64,
}

impl From<&StatementLine> for StatementLineRep {
    fn from(line: &StatementLine) -> Self {
        Self {
            entry_id: line.entry_id,
            date: line.date,
            description: line.description.clone(),
            counterpart_code: line.counterpart_code.clone(),
            counterpart_name: line.counterpart_name.clone(),
            side: side_name(line.side),
            amount: line.amount,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSectionRep {
    pub month: PostingMonth,
    pub lines: Vec<StatementLineRep>,
    pub debit_total: i64,
    pub credit_total: i64,
    pub period_closing: i64,
    pub running_balance: BalanceRep,
}

impl From<&MonthSection> for MonthSectionRep {
    fn from(section: &MonthSection) -> Self {
        Self {
            month: section.month,
            lines: section.lines.iter().map(StatementLineRep::from).collect(),
            debit_total: section.debit_total,
            credit_total: section.credit_total,
            period_closing: section.period_closing,
            running_balance: section.running_balance.into(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralLedgerView {
    pub account: AccountRep,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub opening_balance: BalanceRep,
    pub months: Vec<MonthSectionRep>,
    pub debit_grand_total: i64,
    pub credit_grand_total: i64,
    pub final_balance: BalanceRep,
}

impl From<&GeneralLedgerStatement> for GeneralLedgerView {
    fn from(statement: &GeneralLedgerStatement) -> Self {
        Self {
            account: (&statement.account).into(),
            date_from: statement.date_from,
            date_to: statement.date_to,
            opening_balance: statement.opening_balance.into(),
            months: statement.months.iter().map(MonthSectionRep::from).collect(),
            debit_grand_total: statement.debit_grand_total,
            credit_grand_total: statement.credit_grand_total,
            final_balance: statement.final_balance.into(),
        }
    }
}

fn side_name(side: Side) -> &'static str {
    match side {
        Side::Debit => "debit",
        Side::Credit => "credit",
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ledger::domain::transfer::{IneligibleEntry, REASON_NOT_RECORDED};

    #[test]
    fn validation_result_reports_missing_ids_as_errors() {
        let report = EligibilityReport {
            eligible: vec![1],
            ineligible: vec![IneligibleEntry {
                id: 2,
                reason: REASON_NOT_RECORDED,
            }],
            missing: vec![42],
        };

        let rep = ValidationResult::from(report);

        assert!(!rep.is_valid);
        assert_eq!(vec![1], rep.eligible_transactions);
        assert_eq!("not recorded", rep.ineligible_transactions[0].reason);
        assert_eq!(vec!["No entry found with ID 42.".to_owned()], rep.errors);
        assert!(rep.warnings.is_empty());
    }

    #[test]
    fn reps_serialize_with_client_field_names() {
        let report = EligibilityReport {
            eligible: vec![5],
            ineligible: Vec::new(),
            missing: Vec::new(),
        };

        let value = serde_json::to_value(ValidationResult::from(report))
            .expect("serialization failed");

        assert_eq!(
            serde_json::json!({
                "isValid": true,
                "eligibleTransactions": [5],
                "ineligibleTransactions": [],
                "errors": [],
                "warnings": [],
            }),
            value
        );

        let balance = serde_json::to_value(BalanceRep::from(Balance::from_signed(-250)))
            .expect("serialization failed");

        assert_eq!(
            serde_json::json!({"balanceType": "credit", "amount": 250}),
            balance
        );
    }

    #[test]
    fn balance_rep_uses_display_sides() {
        let debit = BalanceRep::from(Balance::from_signed(1_500));
        assert_eq!("debit", debit.balance_type);
        assert_eq!(1_500, debit.amount);

        let credit = BalanceRep::from(Balance::from_signed(-1_500));
        assert_eq!("credit", credit.balance_type);
        assert_eq!(1_500, credit.amount);
    }
}
