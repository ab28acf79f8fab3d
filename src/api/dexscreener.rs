//! DexScreener token pair adapter.

use super::http;
use super::models::TokenSnapshot;
use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use reqwest::Client;
use serde::Deserialize;

const PROVIDER_ID: &str = "dexscreener";

#[derive(Debug, Deserialize)]
struct PairsResponse {
    #[serde(default)]
    pairs: Option<Vec<Pair>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Pair {
    chain_id: String,
    dex_id: Option<String>,
    pair_address: Option<String>,
    base_token: BaseToken,
    price_usd: Option<String>,
    price_change: Option<Window>,
    volume: Option<Window>,
    liquidity: Option<Liquidity>,
    market_cap: Option<f64>,
    fdv: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct BaseToken {
    address: String,
    name: String,
    symbol: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Window {
    h24: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct Liquidity {
    usd: Option<f64>,
}

impl Pair {
    fn liquidity(&self) -> f64 {
        self.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0)
    }

    fn into_snapshot(self) -> Result<TokenSnapshot> {
        let price_usd = self
            .price_usd
            .as_deref()
            .and_then(|p| p.parse::<f64>().ok())
            .ok_or_else(|| {
                Error::provider(
                    PROVIDER_ID,
                    format!("pair for {} has no USD price", self.base_token.symbol),
                )
            })?;

        Ok(TokenSnapshot {
            address: self.base_token.address,
            symbol: self.base_token.symbol,
            name: self.base_token.name,
            chain: self.chain_id,
            price_usd,
            change_24h: self.price_change.and_then(|w| w.h24),
            volume_24h: self.volume.and_then(|w| w.h24),
            liquidity_usd: self.liquidity.and_then(|l| l.usd),
            market_cap: self.market_cap.or(self.fdv),
            dex: self.dex_id,
            pair_address: self.pair_address,
        })
    }
}

/// Token pair lookups against the DexScreener API.
#[derive(Debug, Clone)]
pub struct DexScreenerProvider {
    client: Client,
    base_url: String,
}

impl DexScreenerProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            client: http::client(config.timeout())?,
            base_url: config.dexscreener_url.trim_end_matches('/').to_string(),
        })
    }

    /// Snapshot of the most liquid pair for a token address or symbol.
    pub async fn token_snapshot(&self, query: &str, chain: Option<&str>) -> Result<TokenSnapshot> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::invalid_argument("token address must not be empty"));
        }

        let response: PairsResponse = if looks_like_address(query) {
            let url = format!("{}/latest/dex/tokens/{query}", self.base_url);
            http::get_json(&self.client, PROVIDER_ID, &url, &[]).await?
        } else {
            let url = format!("{}/latest/dex/search", self.base_url);
            http::get_json(&self.client, PROVIDER_ID, &url, &[("q", query)]).await?
        };

        select_pair(response.pairs.unwrap_or_default(), query, chain)
            .ok_or_else(|| {
                Error::provider(
                    PROVIDER_ID,
                    match chain {
                        Some(chain) => format!("no pairs found for '{query}' on {chain}"),
                        None => format!("no pairs found for '{query}'"),
                    },
                )
            })?
            .into_snapshot()
    }
}

/// EVM hex addresses and base58-style addresses.
fn looks_like_address(query: &str) -> bool {
    (query.starts_with("0x") && query.len() == 42)
        || (query.len() >= 32 && query.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Most liquid pair on `chain`, preferring pairs whose base token matches a
/// symbol query.
fn select_pair(pairs: Vec<Pair>, query: &str, chain: Option<&str>) -> Option<Pair> {
    let on_chain: Vec<Pair> = pairs
        .into_iter()
        .filter(|p| chain.is_none_or(|c| p.chain_id.eq_ignore_ascii_case(c)))
        .collect();

    let matching: Vec<&Pair> = on_chain
        .iter()
        .filter(|p| {
            p.base_token.symbol.eq_ignore_ascii_case(query)
                || p.base_token.address.eq_ignore_ascii_case(query)
        })
        .collect();
    let candidates = if matching.is_empty() {
        on_chain.iter().collect()
    } else {
        matching
    };

    candidates
        .into_iter()
        .max_by(|a, b| a.liquidity().total_cmp(&b.liquidity()))
        .cloned()
}
