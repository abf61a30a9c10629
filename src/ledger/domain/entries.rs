use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::posting_month::PostingMonth;

pub type EntryId = i64;
pub type AccountId = i32;
pub type CategoryId = i32;

/// The subsidiary book an entry was recorded in, or `GeneralLedger` for
/// parent postings created by the transfer engine.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookType {
    CashReceipt,
    CashDisbursement,
    GeneralJournal,
    GeneralLedger,
}

#[derive(Debug, Error, Eq, PartialEq)]
#[error("unknown book type {0:?}")]
pub struct BookTypeParseError(pub String);

impl BookType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CashReceipt => "cash_receipt",
            Self::CashDisbursement => "cash_disbursement",
            Self::GeneralJournal => "general_journal",
            Self::GeneralLedger => "general_ledger",
        }
    }
}

impl fmt::Display for BookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookType {
    type Err = BookTypeParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "cash_receipt" => Ok(Self::CashReceipt),
            "cash_disbursement" => Ok(Self::CashDisbursement),
            "general_journal" => Ok(Self::GeneralJournal),
            "general_ledger" => Ok(Self::GeneralLedger),
            other => Err(BookTypeParseError(other.to_owned())),
        }
    }
}

/// VAT treatment of a leaf entry. The VAT portion is always derived from the
/// gross amount, never stored.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VatClass {
    Standard,
    Reduced,
    Zero,
    Exempt,
}

#[derive(Debug, Error, Eq, PartialEq)]
#[error("unknown VAT class {0:?}")]
pub struct VatClassParseError(pub String);

impl VatClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Reduced => "reduced",
            Self::Zero => "zero",
            Self::Exempt => "exempt",
        }
    }

    fn rate_percent(&self) -> i64 {
        match self {
            Self::Standard => 21,
            Self::Reduced => 9,
            Self::Zero | Self::Exempt => 0,
        }
    }

    /// The VAT portion contained in a gross amount of minor currency units,
    /// rounded half-up.
    pub fn vat_amount(&self, gross_amount: i64) -> i64 {
        let rate = self.rate_percent();
        if rate == 0 {
            return 0;
        }

        let denominator = 100 + rate;

        (gross_amount * rate + denominator / 2) / denominator
    }
}

impl FromStr for VatClass {
    type Err = VatClassParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "standard" => Ok(Self::Standard),
            "reduced" => Ok(Self::Reduced),
            "zero" => Ok(Self::Zero),
            "exempt" => Ok(Self::Exempt),
            other => Err(VatClassParseError(other.to_owned())),
        }
    }
}

/// Where an entry sits in the record/transfer lifecycle.
///
/// ```text
/// Draft --record--> Recorded --transfer--> Transferred
/// Draft <--undo-record-- Recorded   (only while untransferred)
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntryState {
    Draft,
    Recorded,
    Transferred,
}

/// A single row of the polymorphic entry table. Both leaf entries from the
/// subsidiary books and parent general ledger postings use this shape; the
/// combination of `book_type` and `gl_parent_id` discriminates them.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub id: EntryId,
    pub user_id: Uuid,
    pub amount: i64,
    pub description: String,
    pub transaction_date: NaiveDate,
    pub book_type: BookType,
    pub reference: Option<String>,
    pub vat_class: Option<VatClass>,
    pub debit_account_id: AccountId,
    pub credit_account_id: AccountId,
    pub category_id: Option<CategoryId>,
    pub recorded_at: Option<DateTime<Utc>>,
    pub transferred_to_gl_at: Option<DateTime<Utc>>,
    pub gl_parent_id: Option<EntryId>,
    pub gl_posting_month: Option<PostingMonth>,
    pub created_at: DateTime<Utc>,
}

impl Entry {
    /// A parent posting created by the transfer engine.
    pub fn is_parent_gl(&self) -> bool {
        self.book_type == BookType::GeneralLedger && self.gl_parent_id.is_none()
    }

    /// A leaf entry that has been folded into a parent posting.
    pub fn is_child_transaction(&self) -> bool {
        self.gl_parent_id.is_some()
    }

    pub fn state(&self) -> EntryState {
        if self.transferred_to_gl_at.is_some() {
            EntryState::Transferred
        } else if self.recorded_at.is_some() {
            EntryState::Recorded
        } else {
            EntryState::Draft
        }
    }

    /// The VAT portion of the entry's gross amount. Parent postings carry no
    /// VAT classification, so their derived VAT is zero.
    pub fn vat_amount(&self) -> i64 {
        self.vat_class
            .map(|class| class.vat_amount(self.amount))
            .unwrap_or(0)
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
#[error("an entry may not debit and credit the same account ({0})")]
pub struct MatchingLegsError(pub AccountId);

/// Every entry must move value between two distinct accounts.
pub fn ensure_distinct_legs(
    debit_account_id: AccountId,
    credit_account_id: AccountId,
) -> Result<(), MatchingLegsError> {
    if debit_account_id == credit_account_id {
        Err(MatchingLegsError(debit_account_id))
    } else {
        Ok(())
    }
}

/// A chart-of-accounts entry. The directory is consumed read-only by the
/// ledger engine.
#[derive(Clone, Debug, PartialEq)]
pub struct Account {
    pub id: AccountId,
    pub code: String,
    pub name: String,
    pub kind: AccountKind,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccountKind {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

#[derive(Debug, Error, Eq, PartialEq)]
#[error("unknown account kind {0:?}")]
pub struct AccountKindParseError(pub String);

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
        }
    }
}

impl FromStr for AccountKind {
    type Err = AccountKindParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "asset" => Ok(Self::Asset),
            "liability" => Ok(Self::Liability),
            "equity" => Ok(Self::Equity),
            "revenue" => Ok(Self::Revenue),
            "expense" => Ok(Self::Expense),
            other => Err(AccountKindParseError(other.to_owned())),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

#[cfg(test)]
mod test {
    use super::*;

    fn entry(book_type: BookType, gl_parent_id: Option<EntryId>) -> Entry {
        Entry {
            id: 1,
            user_id: Uuid::new_v4(),
            amount: 10_000,
            description: "Office supplies".to_owned(),
            transaction_date: NaiveDate::from_ymd_opt(2024, 3, 12).unwrap(),
            book_type,
            reference: None,
            vat_class: Some(VatClass::Standard),
            debit_account_id: 101,
            credit_account_id: 401,
            category_id: Some(7),
            recorded_at: None,
            transferred_to_gl_at: None,
            gl_parent_id,
            gl_posting_month: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn parent_gl_requires_general_ledger_book_without_parent() {
        assert!(entry(BookType::GeneralLedger, None).is_parent_gl());
        assert!(!entry(BookType::GeneralLedger, Some(99)).is_parent_gl());
        assert!(!entry(BookType::CashReceipt, None).is_parent_gl());
    }

    #[test]
    fn child_transaction_is_marked_by_parent_reference() {
        assert!(entry(BookType::CashReceipt, Some(99)).is_child_transaction());
        assert!(!entry(BookType::CashReceipt, None).is_child_transaction());
    }

    #[test]
    fn lifecycle_state_follows_markers() {
        let mut subject = entry(BookType::CashReceipt, None);
        assert_eq!(EntryState::Draft, subject.state());

        subject.recorded_at = Some(Utc::now());
        assert_eq!(EntryState::Recorded, subject.state());

        subject.transferred_to_gl_at = Some(Utc::now());
        assert_eq!(EntryState::Transferred, subject.state());
    }

    #[test]
    fn standard_vat_is_extracted_from_gross_amount() {
        // 121.00 gross at 21% contains 21.00 of VAT.
        assert_eq!(2_100, VatClass::Standard.vat_amount(12_100));
    }

    #[test]
    fn vat_rounds_half_up() {
        // 10.00 gross at 21%: 1000 * 21 / 121 = 173.55..., rounds to 174.
        assert_eq!(174, VatClass::Standard.vat_amount(1_000));
    }

    #[test]
    fn zero_and_exempt_classes_carry_no_vat() {
        assert_eq!(0, VatClass::Zero.vat_amount(12_100));
        assert_eq!(0, VatClass::Exempt.vat_amount(12_100));
    }

    #[test]
    fn parent_posting_has_no_derived_vat() {
        let mut parent = entry(BookType::GeneralLedger, None);
        parent.vat_class = None;

        assert_eq!(0, parent.vat_amount());
    }

    #[test]
    fn matching_legs_are_rejected() {
        let error = ensure_distinct_legs(101, 101).expect_err("matching legs should be invalid");

        assert_eq!(MatchingLegsError(101), error);
        assert!(ensure_distinct_legs(101, 401).is_ok());
    }

    #[test]
    fn book_type_round_trips_through_storage_form() {
        for book_type in [
            BookType::CashReceipt,
            BookType::CashDisbursement,
            BookType::GeneralJournal,
            BookType::GeneralLedger,
        ] {
            assert_eq!(Ok(book_type), book_type.as_str().parse());
        }
    }
}
