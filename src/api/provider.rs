//! Market data provider contract and the composite adapter.

use super::dexscreener::DexScreenerProvider;
use super::defillama::DefiLlamaProvider;
use super::models::{
    CategoryTvl, ChainTvl, ProtocolSnapshot, SeriesKind, SeriesPoint, TokenSnapshot,
};
use crate::config::ProviderConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Source of market data records.
///
/// Failures surface as `Error::Provider` naming the upstream; callers never
/// retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Snapshot of a token by contract address or symbol.
    async fn fetch_token_snapshot(
        &self,
        address: &str,
        chain: Option<String>,
    ) -> Result<TokenSnapshot>;

    async fn fetch_protocol_snapshot(&self, name: &str) -> Result<ProtocolSnapshot>;

    /// Chains ordered by TVL, largest first.
    async fn fetch_chains_tvl(&self) -> Result<Vec<ChainTvl>>;

    /// Protocol categories ordered by TVL, largest first.
    async fn fetch_category_distribution(&self) -> Result<Vec<CategoryTvl>>;

    /// Oldest-first time series.
    async fn fetch_historical_series(
        &self,
        entity: &str,
        kind: SeriesKind,
    ) -> Result<Vec<SeriesPoint>>;

    /// Largest protocols by TVL.
    async fn fetch_top_protocols(&self, limit: usize) -> Result<Vec<ProtocolSnapshot>>;
}

/// Routes token lookups to DexScreener and everything else to DefiLlama.
#[derive(Debug, Clone)]
pub struct CompositeProvider {
    dex: DexScreenerProvider,
    llama: DefiLlamaProvider,
}

impl CompositeProvider {
    pub fn new(dex: DexScreenerProvider, llama: DefiLlamaProvider) -> Self {
        Self { dex, llama }
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        Ok(Self::new(
            DexScreenerProvider::new(config)?,
            DefiLlamaProvider::new(config)?,
        ))
    }
}

#[async_trait]
impl MarketDataProvider for CompositeProvider {
    async fn fetch_token_snapshot(
        &self,
        address: &str,
        chain: Option<String>,
    ) -> Result<TokenSnapshot> {
        self.dex.token_snapshot(address, chain.as_deref()).await
    }

    async fn fetch_protocol_snapshot(&self, name: &str) -> Result<ProtocolSnapshot> {
        self.llama.protocol_snapshot(name).await
    }

    async fn fetch_chains_tvl(&self) -> Result<Vec<ChainTvl>> {
        self.llama.chains_tvl().await
    }

    async fn fetch_category_distribution(&self) -> Result<Vec<CategoryTvl>> {
        self.llama.category_distribution().await
    }

    async fn fetch_historical_series(
        &self,
        entity: &str,
        kind: SeriesKind,
    ) -> Result<Vec<SeriesPoint>> {
        self.llama.historical_series(entity, kind).await
    }

    async fn fetch_top_protocols(&self, limit: usize) -> Result<Vec<ProtocolSnapshot>> {
        self.llama.top_protocols(limit).await
    }
}
