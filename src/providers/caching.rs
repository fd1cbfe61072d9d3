use crate::core::cache::Cache;
use crate::core::{PriceProvider, PriceQuery, PriceTable};
use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

/// Partition of the on-disk cache holding fetched price tables.
pub const PRICE_CACHE_NAME: &str = "prices";

/// Serves repeated identical queries from an expiring cache.
///
/// Only successful fetches are cached, so a failed request is retried on the
/// next call.
pub struct CachingPriceProvider<T: PriceProvider> {
    inner: T,
    cache: Cache<PriceQuery, PriceTable>,
}

impl<T: PriceProvider> CachingPriceProvider<T> {
    pub fn new(inner: T, cache: Cache<PriceQuery, PriceTable>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl<T: PriceProvider> PriceProvider for CachingPriceProvider<T> {
    async fn fetch_prices(&self, query: &PriceQuery) -> Result<PriceTable> {
        if let Some(cached) = self.cache.get(query).await {
            debug!("Cache hit for prices: {:?}", query.tickers());
            return Ok(cached);
        }
        debug!("Cache miss for prices: {:?}", query.tickers());
        let table = self.inner.fetch_prices(query).await?;
        self.cache.put(query, table.clone()).await;
        Ok(table)
    }
}
