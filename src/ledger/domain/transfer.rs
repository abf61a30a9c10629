//! Pure transfer logic: eligibility classification over a batch of entry
//! statuses, and the account-pair grouping fold that turns eligible source
//! entries into one aggregate posting per (debit, credit) pair.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::entries::{AccountId, EntryId};

/// Stable, user-visible reasons for per-entry ineligibility.
pub const REASON_NOT_RECORDED: &str = "not recorded";
pub const REASON_ALREADY_TRANSFERRED: &str = "already transferred";

/// The lifecycle markers of a candidate entry, as loaded from the store.
#[derive(Clone, Copy, Debug)]
pub struct EntryStatus {
    pub id: EntryId,
    pub recorded_at: Option<DateTime<Utc>>,
    pub transferred_to_gl_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IneligibleEntry {
    pub id: EntryId,
    pub reason: &'static str,
}

/// The outcome of classifying a batch of candidate entry ids.
///
/// Per-id ineligibility is data, not an error. Ids that do not exist under
/// the requesting user are a structural problem and are reported separately
/// in `missing`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct EligibilityReport {
    pub eligible: Vec<EntryId>,
    pub ineligible: Vec<IneligibleEntry>,
    pub missing: Vec<EntryId>,
}

impl EligibilityReport {
    /// A transfer may proceed when at least one entry is eligible and every
    /// requested id resolved to an entry.
    pub fn is_valid(&self) -> bool {
        !self.eligible.is_empty() && self.missing.is_empty()
    }
}

/// Classify every requested id as eligible, ineligible with a reason, or
/// missing. The classification is a pure read and may be repeated freely.
pub fn classify_eligibility(
    requested_ids: &[EntryId],
    statuses: &[EntryStatus],
) -> EligibilityReport {
    let statuses_by_id: HashMap<EntryId, &EntryStatus> =
        statuses.iter().map(|status| (status.id, status)).collect();

    let mut report = EligibilityReport::default();
    let mut seen = Vec::with_capacity(requested_ids.len());

    for &id in requested_ids {
        // A repeated id contributes a single classification.
        if seen.contains(&id) {
            continue;
        }
        seen.push(id);

        match statuses_by_id.get(&id) {
            None => report.missing.push(id),
            Some(status) if status.transferred_to_gl_at.is_some() => {
                report.ineligible.push(IneligibleEntry {
                    id,
                    reason: REASON_ALREADY_TRANSFERRED,
                });
            }
            Some(status) if status.recorded_at.is_none() => {
                report.ineligible.push(IneligibleEntry {
                    id,
                    reason: REASON_NOT_RECORDED,
                });
            }
            Some(_) => report.eligible.push(id),
        }
    }

    report
}

/// The grouping key for a transfer: the debit and credit sides are
/// distinguished, never swapped, so (101, 401) and (401, 101) form separate
/// groups.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct AccountPair {
    pub debit_account_id: AccountId,
    pub credit_account_id: AccountId,
}

/// An eligible source entry, reduced to the fields the grouping fold needs.
#[derive(Clone, Copy, Debug)]
pub struct SourceEntry {
    pub id: EntryId,
    pub amount: i64,
    pub debit_account_id: AccountId,
    pub credit_account_id: AccountId,
}

/// One group of source entries sharing an account pair, ready to become a
/// single parent posting.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccountPairGroup {
    pub pair: AccountPair,
    pub entry_ids: Vec<EntryId>,
    pub total_amount: i64,
}

/// Fold source entries into one group per account pair, preserving the order
/// in which pairs first appear. Amounts are summed with exact integer
/// arithmetic; categories play no part in the key, so entries with different
/// categories still merge.
pub fn group_by_account_pair(entries: &[SourceEntry]) -> Vec<AccountPairGroup> {
    let mut groups: Vec<AccountPairGroup> = Vec::new();
    let mut index_by_pair: HashMap<AccountPair, usize> = HashMap::new();

    for entry in entries {
        let pair = AccountPair {
            debit_account_id: entry.debit_account_id,
            credit_account_id: entry.credit_account_id,
        };

        match index_by_pair.get(&pair) {
            Some(&index) => {
                let group = &mut groups[index];
                group.entry_ids.push(entry.id);
                group.total_amount += entry.amount;
            }
            None => {
                index_by_pair.insert(pair, groups.len());
                groups.push(AccountPairGroup {
                    pair,
                    entry_ids: vec![entry.id],
                    total_amount: entry.amount,
                });
            }
        }
    }

    groups
}

#[cfg(test)]
mod test {
    use super::*;

    fn recorded(id: EntryId) -> EntryStatus {
        EntryStatus {
            id,
            recorded_at: Some(Utc::now()),
            transferred_to_gl_at: None,
        }
    }

    fn draft(id: EntryId) -> EntryStatus {
        EntryStatus {
            id,
            recorded_at: None,
            transferred_to_gl_at: None,
        }
    }

    fn transferred(id: EntryId) -> EntryStatus {
        EntryStatus {
            id,
            recorded_at: Some(Utc::now()),
            transferred_to_gl_at: Some(Utc::now()),
        }
    }

    fn source(
        id: EntryId,
        amount: i64,
        debit_account_id: AccountId,
        credit_account_id: AccountId,
    ) -> SourceEntry {
        SourceEntry {
            id,
            amount,
            debit_account_id,
            credit_account_id,
        }
    }

    #[test]
    fn recorded_untransferred_entries_are_eligible() {
        let report = classify_eligibility(&[1, 2], &[recorded(1), recorded(2)]);

        assert_eq!(vec![1, 2], report.eligible);
        assert!(report.ineligible.is_empty());
        assert!(report.missing.is_empty());
        assert!(report.is_valid());
    }

    #[test]
    fn draft_entry_is_ineligible_with_not_recorded_reason() {
        let report = classify_eligibility(&[1, 2], &[recorded(1), draft(2)]);

        assert_eq!(vec![1], report.eligible);
        assert_eq!(
            vec![IneligibleEntry {
                id: 2,
                reason: REASON_NOT_RECORDED,
            }],
            report.ineligible
        );
        assert!(report.is_valid());
    }

    #[test]
    fn transferred_entry_is_ineligible_with_already_transferred_reason() {
        let report = classify_eligibility(&[1], &[transferred(1)]);

        assert_eq!(
            vec![IneligibleEntry {
                id: 1,
                reason: REASON_ALREADY_TRANSFERRED,
            }],
            report.ineligible
        );
        assert!(!report.is_valid());
    }

    #[test]
    fn missing_ids_are_structural_errors_not_per_id_results() {
        let report = classify_eligibility(&[1, 42], &[recorded(1)]);

        assert_eq!(vec![1], report.eligible);
        assert!(report.ineligible.is_empty());
        assert_eq!(vec![42], report.missing);
        assert!(!report.is_valid());
    }

    #[test]
    fn only_ineligible_entries_invalidate_the_batch() {
        let report = classify_eligibility(&[1], &[draft(1)]);

        assert!(report.eligible.is_empty());
        assert!(!report.is_valid());
    }

    #[test]
    fn duplicate_requested_ids_classify_once() {
        let report = classify_eligibility(&[1, 1, 1], &[recorded(1)]);

        assert_eq!(vec![1], report.eligible);
    }

    #[test]
    fn grouping_merges_matching_pairs_and_sums_amounts() {
        let groups = group_by_account_pair(&[
            source(1, 10_000, 101, 401),
            source(2, 5_000, 101, 401),
            source(3, 700, 102, 401),
        ]);

        assert_eq!(2, groups.len());
        assert_eq!(
            AccountPairGroup {
                pair: AccountPair {
                    debit_account_id: 101,
                    credit_account_id: 401,
                },
                entry_ids: vec![1, 2],
                total_amount: 15_000,
            },
            groups[0]
        );
        assert_eq!(vec![3], groups[1].entry_ids);
        assert_eq!(700, groups[1].total_amount);
    }

    #[test]
    fn grouping_distinguishes_debit_and_credit_roles() {
        let groups =
            group_by_account_pair(&[source(1, 100, 101, 401), source(2, 200, 401, 101)]);

        assert_eq!(2, groups.len());
        assert_ne!(groups[0].pair, groups[1].pair);
    }

    #[test]
    fn grouping_preserves_first_seen_order() {
        let groups = group_by_account_pair(&[
            source(1, 1, 200, 300),
            source(2, 1, 100, 300),
            source(3, 1, 200, 300),
        ]);

        assert_eq!(
            vec![
                AccountPair {
                    debit_account_id: 200,
                    credit_account_id: 300,
                },
                AccountPair {
                    debit_account_id: 100,
                    credit_account_id: 300,
                },
            ],
            groups.iter().map(|group| group.pair).collect::<Vec<_>>()
        );
    }

    #[test]
    fn grouping_of_nothing_is_empty() {
        assert!(group_by_account_pair(&[]).is_empty());
    }
}
