//! Month-bucketed general ledger statement math.
//!
//! The statement is a pure function of the rows handed to it: an opening
//! balance, plus the parent postings whose posting month falls inside the
//! requested range. Children are never rendered here; the ledger shows
//! postings, not raw source entries.

use chrono::NaiveDate;

use super::entries::{Account, AccountId, EntryId};
use super::posting_month::PostingMonth;

/// Which leg of a posting the statement's subject account occupies.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Side {
    Debit,
    Credit,
}

/// A running or final balance with the sign convention used for display:
/// non-negative balances are debit-type, negative balances are reported as
/// credit-type with the sign stripped.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Balance {
    pub balance_type: Side,
    pub amount: i64,
}

impl Balance {
    pub fn from_signed(signed: i64) -> Self {
        if signed >= 0 {
            Self {
                balance_type: Side::Debit,
                amount: signed,
            }
        } else {
            Self {
                balance_type: Side::Credit,
                amount: -signed,
            }
        }
    }
}

/// A parent posting touching the subject account, with its counterpart
/// account preloaded.
#[derive(Clone, Debug, PartialEq)]
pub struct PostingRow {
    pub entry_id: EntryId,
    pub date: NaiveDate,
    pub description: String,
    pub amount: i64,
    pub debit_account_id: AccountId,
    pub credit_account_id: AccountId,
    pub counterpart_code: String,
    pub counterpart_name: String,
    pub posting_month: PostingMonth,
}

/// One rendered statement line.
#[derive(Clone, Debug, PartialEq)]
pub struct StatementLine {
    pub entry_id: EntryId,
    pub date: NaiveDate,
    pub description: String,
    pub counterpart_code: String,
    pub counterpart_name: String,
    pub side: Side,
    pub amount: i64,
}

/// One calendar month of the statement. Months without postings still appear
/// with zero totals and the running balance carried forward.
#[derive(Clone, Debug, PartialEq)]
pub struct MonthSection {
    pub month: PostingMonth,
    pub lines: Vec<StatementLine>,
    pub debit_total: i64,
    pub credit_total: i64,
    /// Debits minus credits for the month, signed.
    pub period_closing: i64,
    pub running_balance: Balance,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeneralLedgerStatement {
    pub account: Account,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub opening_balance: Balance,
    pub months: Vec<MonthSection>,
    pub debit_grand_total: i64,
    pub credit_grand_total: i64,
    pub final_balance: Balance,
}

/// Build the statement for `account` between `date_from` and `date_to`.
///
/// `opening_balance_signed` is the net of all history strictly before
/// `date_from`. `postings` must already be restricted to parent postings
/// touching the account within the month range; rows outside the range are
/// ignored. When the range is inverted there are no month sections and the
/// final balance equals the opening balance.
pub fn build_statement(
    account: Account,
    date_from: NaiveDate,
    date_to: NaiveDate,
    opening_balance_signed: i64,
    postings: Vec<PostingRow>,
) -> GeneralLedgerStatement {
    let months = if date_from <= date_to {
        PostingMonth::containing(date_from).through(PostingMonth::containing(date_to))
    } else {
        Vec::new()
    };

    let mut running = opening_balance_signed;
    let mut debit_grand_total = 0;
    let mut credit_grand_total = 0;
    let mut sections = Vec::with_capacity(months.len());

    for month in months {
        let mut lines: Vec<StatementLine> = postings
            .iter()
            .filter(|posting| posting.posting_month == month)
            .map(|posting| {
                let side = if posting.debit_account_id == account.id {
                    Side::Debit
                } else {
                    Side::Credit
                };

                StatementLine {
                    entry_id: posting.entry_id,
                    date: posting.date,
                    description: posting.description.clone(),
                    counterpart_code: posting.counterpart_code.clone(),
                    counterpart_name: posting.counterpart_name.clone(),
                    side,
                    amount: posting.amount,
                }
            })
            .collect();
        lines.sort_by_key(|line| (line.date, line.entry_id));

        let debit_total: i64 = lines
            .iter()
            .filter(|line| line.side == Side::Debit)
            .map(|line| line.amount)
            .sum();
        let credit_total: i64 = lines
            .iter()
            .filter(|line| line.side == Side::Credit)
            .map(|line| line.amount)
            .sum();

        let period_closing = debit_total - credit_total;
        running += period_closing;
        debit_grand_total += debit_total;
        credit_grand_total += credit_total;

        sections.push(MonthSection {
            month,
            lines,
            debit_total,
            credit_total,
            period_closing,
            running_balance: Balance::from_signed(running),
        });
    }

    GeneralLedgerStatement {
        account,
        date_from,
        date_to,
        opening_balance: Balance::from_signed(opening_balance_signed),
        months: sections,
        debit_grand_total,
        credit_grand_total,
        final_balance: Balance::from_signed(running),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ledger::domain::entries::AccountKind;

    fn cash_account() -> Account {
        Account {
            id: 101,
            code: "101".to_owned(),
            name: "Cash".to_owned(),
            kind: AccountKind::Asset,
        }
    }

    fn posting(
        entry_id: EntryId,
        amount: i64,
        debit: AccountId,
        credit: AccountId,
        month: PostingMonth,
    ) -> PostingRow {
        PostingRow {
            entry_id,
            date: month.first_day(),
            description: "Posting".to_owned(),
            amount,
            debit_account_id: debit,
            credit_account_id: credit,
            counterpart_code: "401".to_owned(),
            counterpart_name: "Sales".to_owned(),
            posting_month: month,
        }
    }

    fn march() -> PostingMonth {
        PostingMonth::new(2024, 3).unwrap()
    }

    #[test]
    fn quarter_with_single_march_posting() {
        // One 15000 debit posting in March, empty January and February.
        let statement = build_statement(
            cash_account(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            0,
            vec![posting(9, 15_000, 101, 401, march())],
        );

        assert_eq!(
            Balance {
                balance_type: Side::Debit,
                amount: 0,
            },
            statement.opening_balance
        );
        assert_eq!(3, statement.months.len());

        let january = &statement.months[0];
        assert!(january.lines.is_empty());
        assert_eq!(0, january.period_closing);
        assert_eq!(Balance::from_signed(0), january.running_balance);

        let march_section = &statement.months[2];
        assert_eq!(1, march_section.lines.len());
        assert_eq!(Side::Debit, march_section.lines[0].side);
        assert_eq!(15_000, march_section.debit_total);
        assert_eq!(15_000, march_section.period_closing);
        assert_eq!(
            Balance {
                balance_type: Side::Debit,
                amount: 15_000,
            },
            march_section.running_balance
        );

        assert_eq!(Balance::from_signed(15_000), statement.final_balance);
        assert_eq!(15_000, statement.debit_grand_total);
        assert_eq!(0, statement.credit_grand_total);
    }

    #[test]
    fn credit_side_posting_reduces_running_balance() {
        let statement = build_statement(
            cash_account(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            4_000,
            vec![posting(3, 10_000, 401, 101, march())],
        );

        let section = &statement.months[0];
        assert_eq!(Side::Credit, section.lines[0].side);
        assert_eq!(-10_000, section.period_closing);

        // 4000 opening minus 10000 credit leaves a credit-type balance of
        // 6000 with the sign stripped for display.
        assert_eq!(
            Balance {
                balance_type: Side::Credit,
                amount: 6_000,
            },
            statement.final_balance
        );
    }

    #[test]
    fn running_balance_carries_across_months() {
        let february = PostingMonth::new(2024, 2).unwrap();
        let statement = build_statement(
            cash_account(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            1_000,
            vec![
                posting(1, 500, 101, 401, february),
                posting(2, 2_000, 401, 101, march()),
            ],
        );

        assert_eq!(
            Balance::from_signed(1_500),
            statement.months[0].running_balance
        );
        assert_eq!(
            Balance {
                balance_type: Side::Credit,
                amount: 500,
            },
            statement.months[1].running_balance
        );
    }

    #[test]
    fn lines_are_ordered_by_date_then_id() {
        let mut early = posting(7, 100, 101, 401, march());
        early.date = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let mut late = posting(2, 100, 101, 401, march());
        late.date = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        let mut same_day = posting(1, 100, 101, 401, march());
        same_day.date = early.date;

        let statement = build_statement(
            cash_account(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            0,
            vec![late, early, same_day],
        );

        let ids: Vec<EntryId> = statement.months[0]
            .lines
            .iter()
            .map(|line| line.entry_id)
            .collect();
        assert_eq!(vec![1, 7, 2], ids);
    }

    #[test]
    fn inverted_range_keeps_opening_balance_as_final() {
        let statement = build_statement(
            cash_account(),
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            -2_500,
            Vec::new(),
        );

        assert!(statement.months.is_empty());
        assert_eq!(statement.opening_balance, statement.final_balance);
        assert_eq!(
            Balance {
                balance_type: Side::Credit,
                amount: 2_500,
            },
            statement.final_balance
        );
    }

    #[test]
    fn statement_is_a_pure_function_of_its_inputs() {
        let build = || {
            build_statement(
                cash_account(),
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
                250,
                vec![
                    posting(1, 15_000, 101, 401, march()),
                    posting(2, 800, 401, 101, march()),
                ],
            )
        };

        assert_eq!(build(), build());
    }
}
