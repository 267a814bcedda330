//! Pure aggregation of ledger data into report figures.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::reports_model::*;
use super::ReportError;
use crate::allotments::Allotment;
use crate::drawdowns::{Drawdown, DrawdownLineItem};
use crate::funds::{Fund, LimitedPartner, PortfolioInvestment};
use crate::reconciliation::Payment;
use crate::utils::FiscalQuarter;

/// Everything the aggregator reads, already loaded from the ledger.
pub struct AggregationInput<'a> {
    pub fund: &'a Fund,
    pub quarter: FiscalQuarter,
    pub kind: ReportKind,
    pub limited_partners: &'a [LimitedPartner],
    pub drawdowns: &'a [Drawdown],
    pub line_items: &'a [DrawdownLineItem],
    pub payments: &'a [Payment],
    /// Current allotments only; reversed ones are left out by the caller.
    pub allotments: &'a [Allotment],
    pub investments: &'a [PortfolioInvestment],
}

#[derive(Default)]
struct Receipts {
    in_quarter: Decimal,
    to_date: Decimal,
}

pub fn aggregate_report(input: &AggregationInput<'_>) -> Result<ReportFigures, ReportError> {
    let quarter_start = input.quarter.start_date();
    let quarter_end = input.quarter.end_date();

    let lps: HashMap<&str, &LimitedPartner> = input
        .limited_partners
        .iter()
        .map(|lp| (lp.id.as_str(), lp))
        .collect();
    let notice_dates: HashMap<&str, NaiveDate> = input
        .drawdowns
        .iter()
        .map(|d| (d.id.as_str(), d.notice_date))
        .collect();

    let live_items: Vec<&DrawdownLineItem> = input
        .line_items
        .iter()
        .filter(|i| !i.status.is_cancelled())
        .collect();
    check_integrity(&live_items, &lps, &notice_dates)?;

    let in_scope: Vec<&DrawdownLineItem> = live_items
        .iter()
        .copied()
        .filter(|i| i.quarter <= input.quarter)
        .collect();

    // First call date per LP, over calls noticed by quarter end.
    let mut first_call: HashMap<&str, NaiveDate> = HashMap::new();
    for item in &live_items {
        let Some(&notice) = notice_dates.get(item.drawdown_id.as_str()) else {
            continue;
        };
        if notice > quarter_end {
            continue;
        }
        first_call
            .entry(item.lp_id.as_str())
            .and_modify(|d| *d = (*d).min(notice))
            .or_insert(notice);
    }

    let mut called: Vec<&LimitedPartner> = first_call
        .keys()
        .filter_map(|id| lps.get(id).copied())
        .collect();
    called.sort_by(|a, b| a.display_name.cmp(&b.display_name).then(a.id.cmp(&b.id)));

    let total_commitment_received_initial_close = match input.fund.initial_close_date {
        Some(close) => called
            .iter()
            .filter(|lp| {
                first_call
                    .get(lp.id.as_str())
                    .is_some_and(|first| *first < close)
            })
            .map(|lp| lp.commitment)
            .sum(),
        None => Decimal::ZERO,
    };
    let total_commitment_received_quarter_end: Decimal =
        called.iter().map(|lp| lp.commitment).sum();

    let gross_cumulative_funds_raised: Decimal = in_scope.iter().map(|i| i.amount_due).sum();

    let funded: Vec<&PortfolioInvestment> = input
        .investments
        .iter()
        .filter(|p| p.funding_date <= quarter_end)
        .collect();
    let cumulative_portfolio_investment_amount: Decimal =
        funded.iter().map(|p| p.amount_invested).sum();

    let mut by_item: HashMap<&str, Decimal> = HashMap::new();
    let mut by_lp: HashMap<&str, Receipts> = HashMap::new();
    for payment in input
        .payments
        .iter()
        .filter(|p| p.is_binding() && p.paid_on <= quarter_end)
    {
        *by_item.entry(payment.line_item_id.as_str()).or_default() += payment.received_amount;
        let receipts = by_lp.entry(payment.lp_id.as_str()).or_default();
        receipts.to_date += payment.received_amount;
        if payment.paid_on >= quarter_start {
            receipts.in_quarter += payment.received_amount;
        }
    }

    let accepted: Decimal = in_scope
        .iter()
        .map(|i| {
            by_item
                .get(i.id.as_str())
                .copied()
                .unwrap_or_default()
                .min(i.amount_due)
        })
        .sum();
    let fees: Decimal = in_scope.iter().map(|i| i.management_fee).sum();

    let reported: Vec<&LimitedPartner> = match input.kind {
        ReportKind::Sebi => called,
        ReportKind::Invi => called
            .into_iter()
            .filter(|lp| input.fund.is_foreign(&lp.geography))
            .collect(),
    };

    let invi = match input.kind {
        ReportKind::Sebi => None,
        ReportKind::Invi => Some(invi_details(input, &reported, &by_lp)),
    };

    Ok(ReportFigures {
        total_commitment_received_initial_close,
        total_commitment_received_quarter_end,
        gross_cumulative_funds_raised,
        cumulative_portfolio_investment_count: funded.len(),
        cumulative_portfolio_investment_amount,
        investable_funds: accepted - fees,
        investor_categories: investor_categories(&reported),
        invi,
    })
}

fn check_integrity(
    items: &[&DrawdownLineItem],
    lps: &HashMap<&str, &LimitedPartner>,
    notice_dates: &HashMap<&str, NaiveDate>,
) -> Result<(), ReportError> {
    let mut unknown_lps: Vec<String> = items
        .iter()
        .filter(|i| !lps.contains_key(i.lp_id.as_str()))
        .map(|i| i.lp_id.clone())
        .collect();
    unknown_lps.sort();
    unknown_lps.dedup();
    if !unknown_lps.is_empty() {
        return Err(ReportError::DataIntegrity {
            message: format!("line items refer to unknown LPs: {}", unknown_lps.join(", ")),
            entity_ids: unknown_lps,
        });
    }

    let orphans: Vec<String> = items
        .iter()
        .filter(|i| !notice_dates.contains_key(i.drawdown_id.as_str()))
        .map(|i| i.id.clone())
        .collect();
    if !orphans.is_empty() {
        return Err(ReportError::DataIntegrity {
            message: "line items without a drawdown".to_string(),
            entity_ids: orphans,
        });
    }

    let negative: Vec<String> = lps
        .values()
        .filter(|lp| lp.commitment < Decimal::ZERO)
        .map(|lp| lp.id.clone())
        .collect();
    if !negative.is_empty() {
        return Err(ReportError::DataIntegrity {
            message: "negative commitments".to_string(),
            entity_ids: negative,
        });
    }
    Ok(())
}

fn investor_categories(lps: &[&LimitedPartner]) -> Vec<InvestorCategory> {
    let mut groups: BTreeMap<(String, String), (usize, Decimal)> = BTreeMap::new();
    for lp in lps {
        let key = (lp.geography.trim().to_string(), lp.investor_type.trim().to_string());
        let entry = groups.entry(key).or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 += lp.commitment;
    }
    groups
        .into_iter()
        .map(
            |((geography, investor_type), (investor_count, total_commitment))| InvestorCategory {
                geography,
                investor_type,
                investor_count,
                total_commitment,
            },
        )
        .collect()
}

fn invi_details(
    input: &AggregationInput<'_>,
    foreign: &[&LimitedPartner],
    receipts: &HashMap<&str, Receipts>,
) -> InviDetails {
    let mut units: HashMap<&str, i64> = HashMap::new();
    for allotment in input.allotments.iter().filter(|a| a.quarter <= input.quarter) {
        *units.entry(allotment.lp_id.as_str()).or_default() += allotment.units;
    }

    let investors: Vec<InviInvestor> = foreign
        .iter()
        .map(|lp| {
            let (quarter_amount, cumulative_amount) = receipts
                .get(lp.id.as_str())
                .map(|r| (r.in_quarter, r.to_date))
                .unwrap_or_default();
            InviInvestor {
                lp_id: lp.id.clone(),
                lp_name: lp.display_name.clone(),
                geography: lp.geography.trim().to_string(),
                investor_type: lp.investor_type.clone(),
                commitment: lp.commitment,
                dp_id: lp.depository.dp_id.clone(),
                client_id: lp.depository.client_id.clone(),
                depository: lp.depository.depository.clone(),
                quarter_amount,
                cumulative_amount,
                units_allotted: units.get(lp.id.as_str()).copied().unwrap_or_default(),
            }
        })
        .collect();

    let mut countries: BTreeMap<String, CountryAmounts> = BTreeMap::new();
    for investor in &investors {
        let entry = countries
            .entry(investor.geography.clone())
            .or_insert_with(|| CountryAmounts {
                country: investor.geography.clone(),
                investor_count: 0,
                quarter_amount: Decimal::ZERO,
                cumulative_amount: Decimal::ZERO,
            });
        entry.investor_count += 1;
        entry.quarter_amount += investor.quarter_amount;
        entry.cumulative_amount += investor.cumulative_amount;
    }

    InviDetails {
        investors,
        countries: countries.into_values().collect(),
    }
}
