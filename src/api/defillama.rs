//! DefiLlama protocol, chain and price history adapter.

use super::http;
use super::models::{CategoryTvl, ChainTvl, ProtocolSnapshot, SeriesKind, SeriesPoint};
use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::render::slug;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

const PROVIDER_ID: &str = "defillama";

/// Days of price history requested from the coins API.
const PRICE_SPAN_DAYS: &str = "30";

/// `currentChainTvls` keys that are not chains.
const NON_CHAIN_KEYS: &[&str] = &[
    "borrowed",
    "staking",
    "pool2",
    "vesting",
    "offers",
    "doublecounted",
    "liquidstaking",
];

#[derive(Debug, Clone, Deserialize)]
struct ProtocolSummary {
    name: String,
    slug: Option<String>,
    category: Option<String>,
    #[serde(default)]
    chains: Vec<String>,
    tvl: Option<f64>,
    change_1d: Option<f64>,
    change_7d: Option<f64>,
    symbol: Option<String>,
}

impl ProtocolSummary {
    fn into_snapshot(self) -> ProtocolSnapshot {
        ProtocolSnapshot {
            slug: self.slug.unwrap_or_else(|| slug(&self.name)),
            name: self.name,
            category: self.category,
            chains: self.chains,
            tvl: self.tvl.unwrap_or(0.0),
            change_1d: self.change_1d,
            change_7d: self.change_7d,
            symbol: self.symbol.filter(|s| s != "-"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProtocolDetail {
    name: String,
    symbol: Option<String>,
    category: Option<String>,
    #[serde(default)]
    chains: Vec<String>,
    #[serde(default)]
    current_chain_tvls: HashMap<String, f64>,
    #[serde(default)]
    tvl: Vec<TvlPoint>,
}

#[derive(Debug, Deserialize)]
struct TvlPoint {
    date: i64,
    #[serde(rename = "totalLiquidityUSD", alias = "tvl")]
    total_liquidity_usd: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChainSummary {
    name: String,
    tvl: f64,
    token_symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CoinsChart {
    #[serde(default)]
    coins: HashMap<String, CoinPrices>,
}

#[derive(Debug, Deserialize)]
struct CoinPrices {
    #[serde(default)]
    prices: Vec<PricePoint>,
}

#[derive(Debug, Deserialize)]
struct PricePoint {
    timestamp: i64,
    price: f64,
}

fn points(raw: impl IntoIterator<Item = (i64, f64)>) -> Vec<SeriesPoint> {
    let mut points: Vec<SeriesPoint> = raw
        .into_iter()
        .filter_map(|(secs, value)| {
            Some(SeriesPoint {
                timestamp: DateTime::from_timestamp(secs, 0)?,
                value,
            })
        })
        .collect();
    points.sort_by_key(|p| p.timestamp);
    points
}

impl ProtocolDetail {
    fn series(&self) -> Vec<SeriesPoint> {
        points(self.tvl.iter().map(|p| (p.date, p.total_liquidity_usd)))
    }

    fn current_tvl(&self) -> f64 {
        let chain_total: f64 = self
            .current_chain_tvls
            .iter()
            .filter(|(key, _)| {
                !key.contains('-') && !NON_CHAIN_KEYS.contains(&key.to_lowercase().as_str())
            })
            .map(|(_, tvl)| tvl)
            .sum();
        if chain_total > 0.0 {
            chain_total
        } else {
            self.tvl.last().map_or(0.0, |p| p.total_liquidity_usd)
        }
    }

    fn into_snapshot(self, slug: String) -> ProtocolSnapshot {
        let series = self.series();
        let tvl = self.current_tvl();
        let change = |days_back: usize| -> Option<f64> {
            let latest = series.last()?.value;
            let index = series.len().checked_sub(days_back + 1)?;
            let past = series.get(index)?.value;
            (past > 0.0).then(|| (latest - past) / past * 100.0)
        };
        ProtocolSnapshot {
            change_1d: change(1),
            change_7d: change(7),
            name: self.name,
            slug,
            category: self.category,
            chains: self.chains,
            tvl,
            symbol: self.symbol.filter(|s| s != "-"),
        }
    }
}

/// Protocol, chain and price history lookups against DefiLlama.
#[derive(Debug, Clone)]
pub struct DefiLlamaProvider {
    client: Client,
    base_url: String,
    coins_url: String,
}

impl DefiLlamaProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            client: http::client(config.timeout())?,
            base_url: config.defillama_url.trim_end_matches('/').to_string(),
            coins_url: config.coins_url.trim_end_matches('/').to_string(),
        })
    }

    async fn protocols(&self) -> Result<Vec<ProtocolSummary>> {
        let url = format!("{}/protocols", self.base_url);
        http::get_json(&self.client, PROVIDER_ID, &url, &[]).await
    }

    async fn protocol_detail(&self, name: &str) -> Result<(String, ProtocolDetail)> {
        let key = slug(name);
        if key.is_empty() {
            return Err(Error::invalid_argument("protocol name must not be empty"));
        }
        let url = format!("{}/protocol/{key}", self.base_url);
        let detail = http::get_json(&self.client, PROVIDER_ID, &url, &[]).await?;
        Ok((key, detail))
    }

    pub async fn protocol_snapshot(&self, name: &str) -> Result<ProtocolSnapshot> {
        let (key, detail) = self.protocol_detail(name).await?;
        Ok(detail.into_snapshot(key))
    }

    pub async fn top_protocols(&self, limit: usize) -> Result<Vec<ProtocolSnapshot>> {
        Ok(rank_protocols(self.protocols().await?, limit))
    }

    pub async fn category_distribution(&self) -> Result<Vec<CategoryTvl>> {
        Ok(categories(self.protocols().await?))
    }

    pub async fn chains_tvl(&self) -> Result<Vec<ChainTvl>> {
        let url = format!("{}/v2/chains", self.base_url);
        let chains: Vec<ChainSummary> = http::get_json(&self.client, PROVIDER_ID, &url, &[]).await?;
        let mut chains: Vec<ChainTvl> = chains
            .into_iter()
            .map(|c| ChainTvl {
                name: c.name,
                tvl: c.tvl,
                token_symbol: c.token_symbol,
            })
            .collect();
        chains.sort_by(|a, b| b.tvl.total_cmp(&a.tvl));
        Ok(chains)
    }

    pub async fn historical_series(&self, entity: &str, kind: SeriesKind) -> Result<Vec<SeriesPoint>> {
        let entity = entity.trim();
        match kind {
            SeriesKind::ProtocolTvl => Ok(self.protocol_detail(entity).await?.1.series()),
            SeriesKind::ChainTvl => {
                let url = if entity.is_empty() {
                    format!("{}/v2/historicalChainTvl", self.base_url)
                } else {
                    format!("{}/v2/historicalChainTvl/{entity}", self.base_url)
                };
                let raw: Vec<TvlPoint> = http::get_json(&self.client, PROVIDER_ID, &url, &[]).await?;
                Ok(points(raw.into_iter().map(|p| (p.date, p.total_liquidity_usd))))
            }
            SeriesKind::Price => {
                if entity.is_empty() {
                    return Err(Error::invalid_argument("price series needs a chain:address key"));
                }
                let url = format!("{}/chart/{entity}", self.coins_url);
                let chart: CoinsChart = http::get_json(
                    &self.client,
                    PROVIDER_ID,
                    &url,
                    &[("span", PRICE_SPAN_DAYS), ("period", "1d")],
                )
                .await?;
                let prices = chart
                    .coins
                    .into_values()
                    .next()
                    .map(|c| c.prices)
                    .unwrap_or_default();
                Ok(points(prices.into_iter().map(|p| (p.timestamp, p.price))))
            }
        }
    }
}

fn rank_protocols(protocols: Vec<ProtocolSummary>, limit: usize) -> Vec<ProtocolSnapshot> {
    let mut ranked: Vec<ProtocolSnapshot> = protocols
        .into_iter()
        .filter(|p| p.tvl.is_some_and(|t| t > 0.0) && p.category.as_deref() != Some("CEX"))
        .map(ProtocolSummary::into_snapshot)
        .collect();
    ranked.sort_by(|a, b| b.tvl.total_cmp(&a.tvl));
    ranked.truncate(limit);
    ranked
}

fn categories(protocols: Vec<ProtocolSummary>) -> Vec<CategoryTvl> {
    let mut totals: HashMap<String, f64> = HashMap::new();
    for protocol in protocols {
        if let (Some(category), Some(tvl)) = (protocol.category, protocol.tvl) {
            if category != "CEX" && tvl > 0.0 {
                *totals.entry(category).or_default() += tvl;
            }
        }
    }
    let mut out: Vec<CategoryTvl> = totals
        .into_iter()
        .map(|(category, tvl)| CategoryTvl { category, tvl })
        .collect();
    out.sort_by(|a, b| b.tvl.total_cmp(&a.tvl).then_with(|| a.category.cmp(&b.category)));
    out
}
