use diesel::prelude::*;
use std::sync::Arc;

use fundflow_core::errors::Result;
use fundflow_core::funds::{Fund, LimitedPartner, PortfolioInvestment, ProfileReaderTrait};

use super::model::{FundDB, LimitedPartnerDB, PortfolioInvestmentDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{not_found_or, StorageError};
use crate::schema::{funds, limited_partners, portfolio_investments};

/// Reads fund and LP profiles. The upserts exist for seeding and for the
/// profile sync that runs outside the settlement pipeline.
pub struct ProfileRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ProfileRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        ProfileRepository { pool, writer }
    }

    pub async fn upsert_fund(&self, fund: Fund) -> Result<()> {
        let row = FundDB::from(&fund);
        self.writer
            .exec(move |conn| {
                diesel::insert_into(funds::table)
                    .values(&row)
                    .on_conflict(funds::id)
                    .do_update()
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    pub async fn upsert_limited_partner(&self, lp: LimitedPartner) -> Result<()> {
        let row = LimitedPartnerDB::try_from(&lp)?;
        self.writer
            .exec(move |conn| {
                diesel::insert_into(limited_partners::table)
                    .values(&row)
                    .on_conflict(limited_partners::id)
                    .do_update()
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    pub async fn add_portfolio_investment(&self, investment: PortfolioInvestment) -> Result<()> {
        let row = PortfolioInvestmentDB::from(&investment);
        self.writer
            .exec(move |conn| {
                diesel::insert_into(portfolio_investments::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}

impl ProfileReaderTrait for ProfileRepository {
    fn list_funds(&self) -> Result<Vec<Fund>> {
        let mut conn = get_connection(&self.pool)?;
        funds::table
            .order(funds::id.asc())
            .select(FundDB::as_select())
            .load::<FundDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(Fund::try_from)
            .collect()
    }

    fn get_fund(&self, fund_id: &str) -> Result<Fund> {
        let mut conn = get_connection(&self.pool)?;
        let row = funds::table
            .find(fund_id)
            .select(FundDB::as_select())
            .first::<FundDB>(&mut conn)
            .map_err(|e| not_found_or("fund", fund_id, e))?;
        Fund::try_from(row)
    }

    fn list_limited_partners(&self, fund_id: &str) -> Result<Vec<LimitedPartner>> {
        let mut conn = get_connection(&self.pool)?;
        limited_partners::table
            .filter(limited_partners::fund_id.eq(fund_id))
            .order(limited_partners::id.asc())
            .select(LimitedPartnerDB::as_select())
            .load::<LimitedPartnerDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(LimitedPartner::try_from)
            .collect()
    }

    fn get_limited_partner(&self, lp_id: &str) -> Result<LimitedPartner> {
        let mut conn = get_connection(&self.pool)?;
        let row = limited_partners::table
            .find(lp_id)
            .select(LimitedPartnerDB::as_select())
            .first::<LimitedPartnerDB>(&mut conn)
            .map_err(|e| not_found_or("limited partner", lp_id, e))?;
        LimitedPartner::try_from(row)
    }

    fn list_portfolio_investments(&self, fund_id: &str) -> Result<Vec<PortfolioInvestment>> {
        let mut conn = get_connection(&self.pool)?;
        portfolio_investments::table
            .filter(portfolio_investments::fund_id.eq(fund_id))
            .order((
                portfolio_investments::funding_date.asc(),
                portfolio_investments::id.asc(),
            ))
            .select(PortfolioInvestmentDB::as_select())
            .load::<PortfolioInvestmentDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(PortfolioInvestment::try_from)
            .collect()
    }
}
