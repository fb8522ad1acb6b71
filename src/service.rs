//! High-level commission service for web applications.
//!
//! Wraps a [`CommissionSource`] in an `Arc` so handlers can share one service
//! without extra locking, loads the rows each operation needs, and runs the
//! pure calculator over them.

use crate::commission::{
    calculate_commission, calculate_period_commissions, rank_attendants, CommissionCalculation,
    PeriodCommission, RankingEntry,
};
use crate::error::{Error, Result};
use crate::model::Sale;
use crate::pagination::{PageParams, PaginatedResponse};
use crate::repository::CommissionSource;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// Commission operations over an external data source.
///
/// # Example
///
/// ```ignore
/// use sistemav::{CommissionService, repository::InMemorySource};
///
/// let service = CommissionService::new(InMemorySource::new());
/// let board = service.ranking(start, end).await?;
/// ```
pub struct CommissionService<S: CommissionSource> {
    source: Arc<S>,
}

impl<S: CommissionSource> Clone for CommissionService<S> {
    fn clone(&self) -> Self {
        CommissionService {
            source: Arc::clone(&self.source),
        }
    }
}

impl<S: CommissionSource> CommissionService<S> {
    pub fn new(source: S) -> Self {
        CommissionService {
            source: Arc::new(source),
        }
    }

    pub fn from_arc(source: Arc<S>) -> Self {
        CommissionService { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Commission for one stored sale.
    ///
    /// Returns `Ok(None)` when the sale or its attendant does not exist, or
    /// when no rule applies to it.
    ///
    /// # Errors
    ///
    /// - `Error::RepositoryError`: the source failed
    /// - `Error::ComputationError`: a monetary column is not numeric
    pub async fn commission_for_sale(&self, sale_id: &str) -> Result<Option<CommissionCalculation>> {
        let Some(sale) = self.source.fetch_sale(sale_id).await? else {
            debug!("Sale {} not found", sale_id);
            return Ok(None);
        };
        let Some(attendant) = self.source.fetch_attendant(&sale.attendant_id).await? else {
            debug!("Attendant {} for sale {} not found", sale.attendant_id, sale_id);
            return Ok(None);
        };
        let rules = self.source.fetch_rules().await?;

        calculate_commission(&sale, &attendant, &rules)
    }

    /// Per-attendant commission totals for sales created in `[start, end]`.
    ///
    /// # Errors
    ///
    /// - `Error::ValidationError`: `start` is after `end`
    /// - `Error::RepositoryError`: the source failed
    /// - `Error::ComputationError`: a monetary column is not numeric
    pub async fn period_commissions(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<BTreeMap<String, PeriodCommission>> {
        check_period(start, end)?;
        let timer = Instant::now();

        let (sales, attendants, rules) = futures::try_join!(
            self.source.fetch_sales(),
            self.source.fetch_attendants(),
            self.source.fetch_rules()
        )?;

        let result = calculate_period_commissions(&sales, &attendants, &rules, start, end)?;
        info!(
            "✓ Period commissions for {} sales computed in {:?}",
            sales.len(),
            timer.elapsed()
        );
        Ok(result)
    }

    /// Leaderboard of every attendant for the period.
    ///
    /// # Errors
    ///
    /// Same as [`period_commissions`](Self::period_commissions).
    pub async fn ranking(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RankingEntry>> {
        check_period(start, end)?;

        let (sales, attendants, rules) = futures::try_join!(
            self.source.fetch_sales(),
            self.source.fetch_attendants(),
            self.source.fetch_rules()
        )?;

        let period = calculate_period_commissions(&sales, &attendants, &rules, start, end)?;
        Ok(rank_attendants(&period, &attendants))
    }

    /// One page of sales, newest first, optionally for a single attendant.
    ///
    /// # Errors
    ///
    /// Returns `Error::RepositoryError` if the source failed.
    pub async fn list_sales(
        &self,
        params: PageParams,
        attendant_id: Option<&str>,
    ) -> Result<PaginatedResponse<Sale>> {
        let mut sales: Vec<Sale> = self
            .source
            .fetch_sales()
            .await?
            .into_iter()
            .filter(|sale| attendant_id.map_or(true, |id| sale.attendant_id == id))
            .collect();
        sales.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = sales.len() as u64;
        let page = params.slice(&sales).to_vec();
        Ok(PaginatedResponse::new(page, total, params))
    }
}

fn check_period(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    if start > end {
        return Err(Error::ValidationError(format!(
            "period start {} is after end {}",
            start, end
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Attendant, CommissionRule, RuleType};
    use crate::repository::InMemorySource;
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, 9, 30, 0).unwrap()
    }

    fn service() -> CommissionService<InMemorySource> {
        let source = InMemorySource::new()
            .with_attendants(vec![
                Attendant::new("a1", "Ana", "15000"),
                Attendant::new("a2", "Bruno", "200"),
            ])
            .with_rules(vec![CommissionRule::new(
                "r1",
                "Padrão",
                RuleType::Percentage,
                Decimal::TEN,
            )])
            .with_sales(vec![
                Sale::new("s1", "a1", "1000", at(3)),
                Sale::new("s2", "a2", "500", at(4)),
                Sale::new("s3", "a2", "700", at(5)),
                Sale::new("s4", "ghost", "900", at(5)),
            ]);
        CommissionService::new(source)
    }

    #[tokio::test]
    async fn test_commission_for_sale() {
        let calc = service().commission_for_sale("s1").await.unwrap().unwrap();
        assert_eq!(calc.commission_value.to_string(), "110.00");

        assert!(service().commission_for_sale("nope").await.unwrap().is_none());
        assert!(service().commission_for_sale("s4").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ranking() {
        let board = service().ranking(at(1), at(30)).await.unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].attendant_id, "a2");
        assert_eq!(board[0].total.to_string(), "120.00");
        assert_eq!(board[1].total.to_string(), "110.00");
    }

    #[tokio::test]
    async fn test_inverted_period_rejected() {
        let err = service()
            .period_commissions(at(10), at(10) - Duration::days(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_list_sales_newest_first() {
        let page = service()
            .list_sales(PageParams::new(1, 2), None)
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 4);
        assert_eq!(page.pagination.total_pages, 2);
        assert_eq!(page.data.len(), 2);
        assert!(page.data[0].created_at >= page.data[1].created_at);

        let bruno = service()
            .list_sales(PageParams::default(), Some("a2"))
            .await
            .unwrap();
        assert_eq!(bruno.pagination.total, 2);
        assert_eq!(bruno.data[0].id, "s3");
    }
}
