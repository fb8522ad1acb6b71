//! Data source trait for the rows the commission engine consumes.
//!
//! The engine never talks to a database itself. A `CommissionSource`
//! implementation (SQL, Supabase REST, a fixture file...) hands it sales,
//! attendants and rules. [`InMemorySource`] is provided for tests and demos.
//!
//! # Error Handling
//!
//! Implementations should return `Error::RepositoryError` for connectivity,
//! query or decoding failures. A missing row is `Ok(None)`, not an error.

use crate::error::Result;
use crate::model::{Attendant, CommissionRule, Sale};

/// Trait for loading commission inputs.
#[allow(async_fn_in_trait)]
pub trait CommissionSource: Send + Sync {
    /// Every sale, in the order the store returns them.
    ///
    /// # Errors
    /// Returns `Err` if the data source is unavailable or the fetch fails
    async fn fetch_sales(&self) -> Result<Vec<Sale>>;

    /// # Errors
    /// Returns `Err` if the data source is unavailable or the fetch fails
    async fn fetch_attendants(&self) -> Result<Vec<Attendant>>;

    /// Commission rules in evaluation order. The first applicable rule prices
    /// a sale, so the order returned here is part of the contract.
    ///
    /// # Errors
    /// Returns `Err` if the data source is unavailable or the fetch fails
    async fn fetch_rules(&self) -> Result<Vec<CommissionRule>>;

    /// Fetch one sale by id.
    ///
    /// Default implementation scans `fetch_sales()`. Override with a keyed
    /// query when the store supports it.
    ///
    /// # Errors
    /// Returns `Err` if the data source is unavailable or the fetch fails
    async fn fetch_sale(&self, id: &str) -> Result<Option<Sale>> {
        Ok(self.fetch_sales().await?.into_iter().find(|s| s.id == id))
    }

    /// Fetch one attendant by id.
    ///
    /// # Errors
    /// Returns `Err` if the data source is unavailable or the fetch fails
    async fn fetch_attendant(&self, id: &str) -> Result<Option<Attendant>> {
        Ok(self
            .fetch_attendants()
            .await?
            .into_iter()
            .find(|a| a.id == id))
    }
}

/// In-memory source for testing.
#[derive(Clone, Debug, Default)]
pub struct InMemorySource {
    sales: Vec<Sale>,
    attendants: Vec<Attendant>,
    rules: Vec<CommissionRule>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sales(mut self, sales: Vec<Sale>) -> Self {
        self.sales = sales;
        self
    }

    pub fn with_attendants(mut self, attendants: Vec<Attendant>) -> Self {
        self.attendants = attendants;
        self
    }

    pub fn with_rules(mut self, rules: Vec<CommissionRule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn insert_sale(&mut self, sale: Sale) {
        self.sales.push(sale);
    }
}

impl CommissionSource for InMemorySource {
    async fn fetch_sales(&self) -> Result<Vec<Sale>> {
        Ok(self.sales.clone())
    }

    async fn fetch_attendants(&self) -> Result<Vec<Attendant>> {
        Ok(self.attendants.clone())
    }

    async fn fetch_rules(&self) -> Result<Vec<CommissionRule>> {
        Ok(self.rules.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_default_lookups_scan_lists() {
        let source = InMemorySource::new()
            .with_sales(vec![Sale::new("s1", "a1", "10", Utc::now())])
            .with_attendants(vec![Attendant::new("a1", "Ana", "0")]);

        let sale = source.fetch_sale("s1").await.unwrap();
        assert_eq!(sale.map(|s| s.attendant_id), Some("a1".to_string()));
        assert!(source.fetch_sale("missing").await.unwrap().is_none());

        let attendant = source.fetch_attendant("a1").await.unwrap();
        assert_eq!(attendant.map(|a| a.name), Some("Ana".to_string()));
    }
}
