//! Pure transaction-to-line-item matching.
//!
//! Rules, in order:
//! 1. Exact external reference against a line item's expected reference.
//!    Binding regardless of amount.
//! 2. A single LP name in the narration with the amount within tolerance of
//!    the outstanding balance. Binding.
//! 3. A single LP name with the amount outside tolerance. Advisory only.
//!
//! Several LP names in one narration, or one reference shared by several
//! line items, is ambiguous and goes to review.

use std::collections::{BTreeSet, HashSet};

use rust_decimal::Decimal;

use super::MatchMethod;
use crate::drawdowns::DrawdownLineItem;
use crate::transactions::BankTransaction;

/// A line item the matcher may attach a transaction to.
#[derive(Debug, Clone)]
pub struct MatchCandidate<'a> {
    pub line_item: &'a DrawdownLineItem,
    pub lp_name: &'a str,
    /// Amount due less binding receipts so far. May be zero or negative.
    pub outstanding: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched {
        line_item_id: String,
        lp_id: String,
        method: MatchMethod,
        binding: bool,
    },
    Ambiguous {
        lp_ids: Vec<String>,
    },
    NoMatch,
    AlreadyLinked,
}

pub struct TransactionMatcher {
    tolerance: Decimal,
}

impl TransactionMatcher {
    pub fn new(tolerance: Decimal) -> Self {
        Self {
            tolerance: tolerance.abs(),
        }
    }

    pub fn match_transaction(
        &self,
        txn: &BankTransaction,
        candidates: &[MatchCandidate<'_>],
        linked: &HashSet<String>,
    ) -> MatchOutcome {
        if linked.contains(&txn.id) {
            return MatchOutcome::AlreadyLinked;
        }
        if !txn.is_credit() {
            return MatchOutcome::NoMatch;
        }

        let reference = normalize_reference(&txn.external_reference);
        let by_reference: Vec<&MatchCandidate<'_>> = candidates
            .iter()
            .filter(|c| {
                c.line_item
                    .expected_reference
                    .as_deref()
                    .map(normalize_reference)
                    .is_some_and(|r| !r.is_empty() && r == reference)
            })
            .collect();
        match by_reference.as_slice() {
            [only] => {
                return MatchOutcome::Matched {
                    line_item_id: only.line_item.id.clone(),
                    lp_id: only.line_item.lp_id.clone(),
                    method: MatchMethod::ExactReference,
                    binding: true,
                }
            }
            [] => {}
            several => return ambiguous(several.iter().copied()),
        }

        let narration = normalize_name(&txn.narration);
        let by_name: Vec<&MatchCandidate<'_>> = candidates
            .iter()
            .filter(|c| narration_mentions(&narration, c.lp_name))
            .collect();
        let lp_ids: BTreeSet<&str> = by_name.iter().map(|c| c.line_item.lp_id.as_str()).collect();

        match lp_ids.len() {
            0 => MatchOutcome::NoMatch,
            1 => {
                // One LP can only hold one live line item per quarter; prefer
                // the one with the balance closest to the amount otherwise.
                let best = by_name
                    .iter()
                    .min_by_key(|c| (txn.amount - c.outstanding).abs());
                match best {
                    Some(c) => {
                        let within = (txn.amount - c.outstanding).abs() <= self.tolerance
                            && c.outstanding > Decimal::ZERO;
                        MatchOutcome::Matched {
                            line_item_id: c.line_item.id.clone(),
                            lp_id: c.line_item.lp_id.clone(),
                            method: if within {
                                MatchMethod::NameAndAmount
                            } else {
                                MatchMethod::NameOnly
                            },
                            binding: within,
                        }
                    }
                    None => MatchOutcome::NoMatch,
                }
            }
            _ => ambiguous(by_name.into_iter()),
        }
    }
}

fn ambiguous<'a, 'b: 'a>(
    candidates: impl Iterator<Item = &'a MatchCandidate<'b>>,
) -> MatchOutcome {
    let lp_ids: BTreeSet<String> = candidates.map(|c| c.line_item.lp_id.clone()).collect();
    MatchOutcome::Ambiguous {
        lp_ids: lp_ids.into_iter().collect(),
    }
}

/// Uppercased reference with whitespace removed.
pub fn normalize_reference(reference: &str) -> String {
    reference
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Lowercased words separated by single spaces, punctuation dropped.
pub fn normalize_name(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whole-word containment of an LP name in an already normalized narration.
pub fn narration_mentions(normalized_narration: &str, lp_name: &str) -> bool {
    let name = normalize_name(lp_name);
    if name.is_empty() {
        return false;
    }
    format!(" {} ", normalized_narration).contains(&format!(" {} ", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::LineItemStatus;
    use crate::transactions::TransactionDirection;
    use crate::utils::FiscalQuarter;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn item(id: &str, lp_id: &str, due: Decimal, reference: Option<&str>) -> DrawdownLineItem {
        let now = NaiveDate::from_ymd_opt(2025, 6, 20)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        DrawdownLineItem {
            id: id.to_string(),
            drawdown_id: "dd-1".to_string(),
            fund_id: "fund-1".to_string(),
            lp_id: lp_id.to_string(),
            quarter: "FY26Q2".parse::<FiscalQuarter>().unwrap(),
            amount_due: due,
            amount_called_up: due,
            remaining_commitment: dec!(0),
            management_fee: dec!(0),
            stamp_duty: dec!(0),
            over_committed: false,
            expected_reference: reference.map(str::to_string),
            status: LineItemStatus::WirePending,
            created_at: now,
            updated_at: now,
        }
    }

    fn txn(reference: &str, narration: &str, amount: Decimal) -> BankTransaction {
        BankTransaction {
            id: format!("txn-{reference}"),
            fund_id: "fund-1".to_string(),
            transaction_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            value_date: None,
            narration: narration.to_string(),
            amount,
            direction: TransactionDirection::Credit,
            currency: "INR".to_string(),
            external_reference: reference.to_string(),
            raw_payload: None,
            imported_at: NaiveDate::from_ymd_opt(2025, 7, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        }
    }

    fn candidates<'a>(items: &'a [(DrawdownLineItem, &'a str)]) -> Vec<MatchCandidate<'a>> {
        items
            .iter()
            .map(|(item, name)| MatchCandidate {
                line_item: item,
                lp_name: name,
                outstanding: item.amount_due,
            })
            .collect()
    }

    #[test]
    fn test_exact_reference_binds_regardless_of_amount() {
        let items = vec![
            (item("li-a", "lp-a", dec!(1000000), Some("utr 42")), "Alpha Trust"),
            (item("li-b", "lp-b", dec!(500000), None), "Beta Capital"),
        ];
        let matcher = TransactionMatcher::new(dec!(50));
        let outcome = matcher.match_transaction(
            &txn("UTR42", "NEFT CR BETA CAPITAL", dec!(12)),
            &candidates(&items),
            &HashSet::new(),
        );
        assert_eq!(
            outcome,
            MatchOutcome::Matched {
                line_item_id: "li-a".to_string(),
                lp_id: "lp-a".to_string(),
                method: MatchMethod::ExactReference,
                binding: true,
            }
        );
    }

    #[test]
    fn test_name_and_amount_within_tolerance_binds() {
        let items = vec![(item("li-a", "lp-a", dec!(1000000), None), "Main Street Capital")];
        let matcher = TransactionMatcher::new(dec!(50));
        let outcome = matcher.match_transaction(
            &txn("UTR1", "NEFT/MAIN STREET CAPITAL/CAPITAL CALL", dec!(999970)),
            &candidates(&items),
            &HashSet::new(),
        );
        assert!(matches!(
            outcome,
            MatchOutcome::Matched {
                method: MatchMethod::NameAndAmount,
                binding: true,
                ..
            }
        ));
    }

    #[test]
    fn test_tolerance_boundary_is_inclusive() {
        let items = vec![(item("li-a", "lp-a", dec!(1000000), None), "Main Street Capital")];
        let matcher = TransactionMatcher::new(dec!(50));
        for amount in [dec!(999950), dec!(1000050)] {
            let outcome = matcher.match_transaction(
                &txn("UTR1", "main street capital", amount),
                &candidates(&items),
                &HashSet::new(),
            );
            assert!(matches!(
                outcome,
                MatchOutcome::Matched {
                    method: MatchMethod::NameAndAmount,
                    binding: true,
                    ..
                }
            ));
        }
        let outside = matcher.match_transaction(
            &txn("UTR1", "main street capital", dec!(999949.99)),
            &candidates(&items),
            &HashSet::new(),
        );
        assert!(matches!(
            outside,
            MatchOutcome::Matched {
                binding: false,
                ..
            }
        ));
    }

    #[test]
    fn test_name_outside_tolerance_is_advisory() {
        let items = vec![(item("li-a", "lp-a", dec!(1000000), None), "Main Street Capital")];
        let matcher = TransactionMatcher::new(dec!(50));
        let outcome = matcher.match_transaction(
            &txn("UTR1", "main street capital", dec!(999930)),
            &candidates(&items),
            &HashSet::new(),
        );
        assert!(matches!(
            outcome,
            MatchOutcome::Matched {
                method: MatchMethod::NameOnly,
                binding: false,
                ..
            }
        ));
    }

    #[test]
    fn test_multiple_names_are_ambiguous() {
        let items = vec![
            (item("li-a", "lp-a", dec!(100), None), "Main Street"),
            (item("li-b", "lp-b", dec!(100), None), "Main Street Capital"),
        ];
        let matcher = TransactionMatcher::new(dec!(50));
        let outcome = matcher.match_transaction(
            &txn("UTR1", "NEFT MAIN STREET CAPITAL", dec!(100)),
            &candidates(&items),
            &HashSet::new(),
        );
        assert_eq!(
            outcome,
            MatchOutcome::Ambiguous {
                lp_ids: vec!["lp-a".to_string(), "lp-b".to_string()]
            }
        );
    }

    #[test]
    fn test_names_match_whole_words_only() {
        assert!(narration_mentions(&normalize_name("IMPS/ACME-FUND/ref"), "Acme Fund"));
        assert!(!narration_mentions(&normalize_name("ACMEFUNDS LTD"), "Acme Fund"));
        assert!(!narration_mentions("anything", "  "));
    }

    #[test]
    fn test_debits_and_linked_transactions_are_skipped() {
        let items = vec![(item("li-a", "lp-a", dec!(100), Some("UTR1")), "Alpha")];
        let matcher = TransactionMatcher::new(dec!(50));

        let mut debit = txn("UTR1", "Alpha", dec!(100));
        debit.direction = TransactionDirection::Debit;
        assert_eq!(
            matcher.match_transaction(&debit, &candidates(&items), &HashSet::new()),
            MatchOutcome::NoMatch
        );

        let credit = txn("UTR1", "Alpha", dec!(100));
        let linked: HashSet<String> = [credit.id.clone()].into_iter().collect();
        assert_eq!(
            matcher.match_transaction(&credit, &candidates(&items), &linked),
            MatchOutcome::AlreadyLinked
        );
    }
}
