//! Conversion of provider records into template payloads.

use super::models::{CategoryTvl, ChainTvl, ProtocolSnapshot, SeriesPoint, TokenSnapshot};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};

/// Builds the JSON payloads templates consume from typed provider records.
pub struct DataConverter;

impl DataConverter {
    /// Token snapshot plus optional price history.
    pub fn token_payload(token: &TokenSnapshot, history: &[SeriesPoint]) -> Value {
        let mut payload = json!({
            "token": {
                "address": token.address,
                "symbol": token.symbol,
                "name": token.name,
                "chain": token.chain,
            },
            "price": {
                "usd": token.price_usd,
                "change24h": token.change_24h,
            },
            "volume": { "usd24h": token.volume_24h },
            "liquidity": { "usd": token.liquidity_usd },
            "marketCap": token.market_cap,
            "dex": token.dex,
        });
        if !history.is_empty() {
            payload["historicalPrices"] = history
                .iter()
                .map(|p| json!({ "timestamp": Self::day(p.timestamp), "price": p.value }))
                .collect();
        }
        payload
    }

    /// Protocol snapshot plus its TVL history.
    pub fn protocol_payload(protocol: &ProtocolSnapshot, history: &[SeriesPoint]) -> Value {
        json!({
            "protocol": {
                "name": protocol.name,
                "slug": protocol.slug,
                "category": protocol.category,
                "chains": protocol.chains,
                "tvl": protocol.tvl,
                "change1d": protocol.change_1d,
                "symbol": protocol.symbol,
            },
            "change1d": protocol.change_1d,
            "change7d": protocol.change_7d,
            "historicalTvl": Self::tvl_points(history),
        })
    }

    /// TVL history of one chain, or of all chains when `chain` is `None`.
    pub fn chain_tvl_payload(chain: Option<&str>, history: &[SeriesPoint]) -> Value {
        let mut payload = json!({
            "name": chain.unwrap_or("DeFi"),
            "historicalTvl": Self::tvl_points(history),
        });
        if let Some(chain) = chain {
            payload["chain"] = json!(chain);
        }
        if let [.., previous, latest] = history {
            if previous.value > 0.0 {
                payload["change1d"] = json!((latest.value - previous.value) / previous.value * 100.0);
            }
        }
        payload
    }

    /// Market overview from the largest protocols and chains.
    pub fn market_payload(
        protocols: &[ProtocolSnapshot],
        chains: &[ChainTvl],
        updated_at: DateTime<Utc>,
    ) -> Value {
        let total: f64 = chains.iter().map(|c| c.tvl).sum();
        let mut payload = json!({
            "topProtocols": protocols
                .iter()
                .map(|p| json!({
                    "name": p.name,
                    "tvl": p.tvl,
                    "category": p.category,
                    "change1d": p.change_1d,
                }))
                .collect::<Vec<_>>(),
            "chains": Self::chain_rows(chains),
            "updatedAt": updated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        });
        if total > 0.0 {
            payload["totalTvl"] = json!(total);
        }
        payload
    }

    /// Chain TVL distribution.
    pub fn chain_distribution_payload(chains: &[ChainTvl]) -> Value {
        json!({ "chains": Self::chain_rows(chains) })
    }

    /// Category TVL distribution.
    pub fn category_distribution_payload(categories: &[CategoryTvl]) -> Value {
        json!({
            "categories": categories
                .iter()
                .map(|c| json!({ "name": c.category, "tvl": c.tvl }))
                .collect::<Vec<_>>(),
        })
    }

    fn chain_rows(chains: &[ChainTvl]) -> Vec<Value> {
        chains
            .iter()
            .map(|c| json!({ "name": c.name, "tvl": c.tvl, "symbol": c.token_symbol }))
            .collect()
    }

    fn tvl_points(history: &[SeriesPoint]) -> Vec<Value> {
        history
            .iter()
            .map(|p| json!({ "date": Self::day(p.timestamp), "tvl": p.value }))
            .collect()
    }

    fn day(timestamp: DateTime<Utc>) -> String {
        timestamp.format("%Y-%m-%d").to_string()
    }
}
