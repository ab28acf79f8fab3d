//! Typed records returned by market data providers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current market state of one token pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSnapshot {
    pub address: String,
    pub symbol: String,
    pub name: String,
    pub chain: String,
    pub price_usd: f64,
    pub change_24h: Option<f64>,
    pub volume_24h: Option<f64>,
    pub liquidity_usd: Option<f64>,
    pub market_cap: Option<f64>,
    /// Venue the pair trades on.
    pub dex: Option<String>,
    pub pair_address: Option<String>,
}

impl TokenSnapshot {
    /// Identifier used for price history lookups (`chain:address`).
    pub fn price_key(&self) -> String {
        format!("{}:{}", self.chain.to_lowercase(), self.address)
    }
}

/// Current state of one protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolSnapshot {
    pub name: String,
    /// Provider lookup key.
    pub slug: String,
    pub category: Option<String>,
    pub chains: Vec<String>,
    pub tvl: f64,
    pub change_1d: Option<f64>,
    pub change_7d: Option<f64>,
    pub symbol: Option<String>,
}

/// TVL held on one chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainTvl {
    pub name: String,
    pub tvl: f64,
    pub token_symbol: Option<String>,
}

/// TVL held by one protocol category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTvl {
    pub category: String,
    pub tvl: f64,
}

/// One point of a time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Which historical series to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeriesKind {
    /// Token price; the entity is a `chain:address` key.
    Price,
    /// Protocol TVL; the entity is a protocol slug.
    ProtocolTvl,
    /// Chain TVL; an empty entity means all chains combined.
    ChainTvl,
}
