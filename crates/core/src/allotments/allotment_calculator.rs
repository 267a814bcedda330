use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::AllotmentError;
use crate::settings::OverpaymentPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllotmentFigures {
    pub amount_accepted: Decimal,
    pub excess_amount: Decimal,
    pub units: i64,
}

/// Units for one line item: `floor(accepted / nav)`.
///
/// Accepted is `min(received, expected)`, or the full receipt when the fund
/// converts overpayments into units.
pub fn allotment_figures(
    line_item_id: &str,
    received: Decimal,
    expected: Decimal,
    nav: Decimal,
    policy: OverpaymentPolicy,
) -> Result<AllotmentFigures, AllotmentError> {
    if nav <= Decimal::ZERO {
        return Err(AllotmentError::DataIntegrity {
            message: format!("NAV must be positive, got {}", nav),
            entity_ids: vec![line_item_id.to_string()],
        });
    }
    if received < Decimal::ZERO || expected < Decimal::ZERO {
        return Err(AllotmentError::DataIntegrity {
            message: format!(
                "negative amounts on line item {}: received {}, expected {}",
                line_item_id, received, expected
            ),
            entity_ids: vec![line_item_id.to_string()],
        });
    }

    let excess_amount = (received - expected).max(Decimal::ZERO);
    let amount_accepted = match policy {
        OverpaymentPolicy::ConvertToUnits => received,
        OverpaymentPolicy::TrackExcess | OverpaymentPolicy::Refund => received.min(expected),
    };

    let units = (amount_accepted / nav)
        .floor()
        .to_i64()
        .ok_or_else(|| AllotmentError::DataIntegrity {
            message: format!("unit count out of range for line item {}", line_item_id),
            entity_ids: vec![line_item_id.to_string()],
        })?;

    Ok(AllotmentFigures {
        amount_accepted,
        excess_amount,
        units,
    })
}
