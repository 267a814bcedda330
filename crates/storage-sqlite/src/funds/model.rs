//! Database models for profiles.

use diesel::prelude::*;

use fundflow_core::funds::{
    DepositoryDetails, Fund, Holder, LimitedPartner, LpStatus, PortfolioInvestment,
};
use fundflow_core::Result;

use crate::errors::StorageError;
use crate::utils::{format_date, parse_date, parse_decimal, parse_enum, parse_optional_date};

#[derive(Queryable, Insertable, AsChangeset, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::funds)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct FundDB {
    pub id: String,
    pub name: String,
    pub currency: String,
    pub nav: String,
    pub management_fee_rate: String,
    pub gst_rate: String,
    pub stamp_duty_rate: String,
    pub initial_close_date: Option<String>,
    pub domestic_jurisdiction: String,
}

#[derive(Queryable, Insertable, AsChangeset, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::limited_partners)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct LimitedPartnerDB {
    pub id: String,
    pub fund_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub commitment: String,
    pub currency: String,
    pub geography: String,
    pub investor_type: String,
    pub status: String,
    pub client_id: Option<String>,
    pub dp_id: Option<String>,
    pub depository: Option<String>,
    /// JSON array of holders.
    pub holders: String,
}

#[derive(Queryable, Insertable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::portfolio_investments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PortfolioInvestmentDB {
    pub id: String,
    pub fund_id: String,
    pub company_name: String,
    pub amount_invested: String,
    pub funding_date: String,
}

impl From<&Fund> for FundDB {
    fn from(fund: &Fund) -> Self {
        Self {
            id: fund.id.clone(),
            name: fund.name.clone(),
            currency: fund.currency.clone(),
            nav: fund.nav.to_string(),
            management_fee_rate: fund.management_fee_rate.to_string(),
            gst_rate: fund.gst_rate.to_string(),
            stamp_duty_rate: fund.stamp_duty_rate.to_string(),
            initial_close_date: fund.initial_close_date.map(format_date),
            domestic_jurisdiction: fund.domestic_jurisdiction.clone(),
        }
    }
}

impl TryFrom<FundDB> for Fund {
    type Error = fundflow_core::Error;

    fn try_from(db: FundDB) -> Result<Self> {
        Ok(Self {
            nav: parse_decimal("funds.nav", &db.nav)?,
            management_fee_rate: parse_decimal(
                "funds.management_fee_rate",
                &db.management_fee_rate,
            )?,
            gst_rate: parse_decimal("funds.gst_rate", &db.gst_rate)?,
            stamp_duty_rate: parse_decimal("funds.stamp_duty_rate", &db.stamp_duty_rate)?,
            initial_close_date: parse_optional_date(
                "funds.initial_close_date",
                db.initial_close_date.as_deref(),
            )?,
            id: db.id,
            name: db.name,
            currency: db.currency,
            domestic_jurisdiction: db.domestic_jurisdiction,
        })
    }
}

impl TryFrom<&LimitedPartner> for LimitedPartnerDB {
    type Error = StorageError;

    fn try_from(lp: &LimitedPartner) -> std::result::Result<Self, StorageError> {
        Ok(Self {
            id: lp.id.clone(),
            fund_id: lp.fund_id.clone(),
            display_name: lp.display_name.clone(),
            email: lp.email.clone(),
            commitment: lp.commitment.to_string(),
            currency: lp.currency.clone(),
            geography: lp.geography.clone(),
            investor_type: lp.investor_type.clone(),
            status: lp.status.as_str().to_string(),
            client_id: lp.depository.client_id.clone(),
            dp_id: lp.depository.dp_id.clone(),
            depository: lp.depository.depository.clone(),
            holders: serde_json::to_string(&lp.depository.holders)?,
        })
    }
}

impl TryFrom<LimitedPartnerDB> for LimitedPartner {
    type Error = fundflow_core::Error;

    fn try_from(db: LimitedPartnerDB) -> Result<Self> {
        let holders: Vec<Holder> =
            serde_json::from_str(&db.holders).map_err(StorageError::from)?;
        Ok(Self {
            commitment: parse_decimal("limited_partners.commitment", &db.commitment)?,
            status: parse_enum("limited_partners.status", &db.status, LpStatus::parse)?,
            depository: DepositoryDetails {
                client_id: db.client_id,
                dp_id: db.dp_id,
                depository: db.depository,
                holders,
            },
            id: db.id,
            fund_id: db.fund_id,
            display_name: db.display_name,
            email: db.email,
            currency: db.currency,
            geography: db.geography,
            investor_type: db.investor_type,
        })
    }
}

impl From<&PortfolioInvestment> for PortfolioInvestmentDB {
    fn from(investment: &PortfolioInvestment) -> Self {
        Self {
            id: investment.id.clone(),
            fund_id: investment.fund_id.clone(),
            company_name: investment.company_name.clone(),
            amount_invested: investment.amount_invested.to_string(),
            funding_date: format_date(investment.funding_date),
        }
    }
}

impl TryFrom<PortfolioInvestmentDB> for PortfolioInvestment {
    type Error = fundflow_core::Error;

    fn try_from(db: PortfolioInvestmentDB) -> Result<Self> {
        Ok(Self {
            amount_invested: parse_decimal(
                "portfolio_investments.amount_invested",
                &db.amount_invested,
            )?,
            funding_date: parse_date("portfolio_investments.funding_date", &db.funding_date)?,
            id: db.id,
            fund_id: db.fund_id,
            company_name: db.company_name,
        })
    }
}
