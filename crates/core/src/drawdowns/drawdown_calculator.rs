//! Pure drawdown arithmetic.
//!
//! Everything here is a function of the fund profile, the active LPs and their
//! prior calls. The service uses the same entry point for preview and commit,
//! so the two can never diverge.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CallBasis, DrawdownError};
use crate::funds::{Fund, LimitedPartner};
use crate::utils::money::round_money;
use crate::utils::FiscalQuarter;

/// Inputs for one drawdown computation.
pub struct CalculationInput<'a> {
    pub fund: &'a Fund,
    /// Active LPs of the fund.
    pub limited_partners: &'a [LimitedPartner],
    /// Sum of amount due across each LP's prior non-cancelled line items.
    pub prior_called: &'a HashMap<String, Decimal>,
    pub basis: CallBasis,
    pub fee_quarter: bool,
}

/// Computed figures for one LP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemFigures {
    pub lp_id: String,
    pub amount_due: Decimal,
    pub amount_called_up: Decimal,
    pub remaining_commitment: Decimal,
    pub management_fee: Decimal,
    pub stamp_duty: Decimal,
    pub over_committed: bool,
}

/// Management fee is levied when the number of quarters elapsed since the
/// fund's first drawdown is even (the first drawdown itself counts as 0).
pub fn is_fee_quarter(first_quarter: Option<&FiscalQuarter>, quarter: &FiscalQuarter) -> bool {
    match first_quarter {
        None => true,
        Some(first) => quarter.quarters_since(first).rem_euclid(2) == 0,
    }
}

/// Fee on a commitment including GST.
pub fn management_fee(commitment: Decimal, fund: &Fund) -> Decimal {
    round_money(commitment * fund.management_fee_rate * (Decimal::ONE + fund.gst_rate))
}

pub fn stamp_duty(amount_due: Decimal, fund: &Fund) -> Decimal {
    round_money(amount_due * fund.stamp_duty_rate)
}

/// Computes one line item per LP, in the order given.
///
/// Fails without producing anything when there are no LPs or when any LP has
/// a non-positive commitment.
pub fn calculate_line_items(
    input: &CalculationInput<'_>,
) -> Result<Vec<LineItemFigures>, DrawdownError> {
    let lps = input.limited_partners;
    if lps.is_empty() {
        return Err(DrawdownError::NoActiveLps {
            fund_id: input.fund.id.clone(),
        });
    }

    let bad: Vec<String> = lps
        .iter()
        .filter(|lp| lp.commitment <= Decimal::ZERO)
        .map(|lp| lp.id.clone())
        .collect();
    if !bad.is_empty() {
        return Err(DrawdownError::DataIntegrity {
            message: format!(
                "{} limited partner(s) have a zero or negative commitment",
                bad.len()
            ),
            entity_ids: bad,
        });
    }

    let amounts = allocate_amounts(lps, input.basis);

    Ok(lps
        .iter()
        .zip(amounts)
        .map(|(lp, amount_due)| {
            let prior = input
                .prior_called
                .get(&lp.id)
                .copied()
                .unwrap_or(Decimal::ZERO);
            let amount_called_up = prior + amount_due;
            let remaining_commitment = lp.commitment - amount_called_up;
            let management_fee = if input.fee_quarter {
                management_fee(lp.commitment, input.fund)
            } else {
                Decimal::ZERO
            };
            LineItemFigures {
                lp_id: lp.id.clone(),
                amount_due,
                amount_called_up,
                remaining_commitment,
                management_fee,
                stamp_duty: stamp_duty(amount_due, input.fund),
                over_committed: remaining_commitment < Decimal::ZERO,
            }
        })
        .collect())
}

fn allocate_amounts(lps: &[LimitedPartner], basis: CallBasis) -> Vec<Decimal> {
    match basis {
        CallBasis::Percentage(pct) => lps
            .iter()
            .map(|lp| round_money(lp.commitment * pct / Decimal::ONE_HUNDRED))
            .collect(),
        CallBasis::AbsoluteTotal(total) => {
            let committed: Decimal = lps.iter().map(|lp| lp.commitment).sum();
            let mut amounts: Vec<Decimal> = lps
                .iter()
                .map(|lp| round_money(total * lp.commitment / committed))
                .collect();

            // Rounding residue goes to the largest commitment so the call sums exactly.
            let residue = total - amounts.iter().copied().sum::<Decimal>();
            if !residue.is_zero() {
                let largest = lps
                    .iter()
                    .enumerate()
                    .fold(0, |best, (idx, lp)| {
                        if lp.commitment > lps[best].commitment {
                            idx
                        } else {
                            best
                        }
                    });
                amounts[largest] += residue;
            }
            amounts
        }
    }
}
