//! Tag derivation and hashtag rendering.

use crate::template::DataShape;
use serde_json::Value;

/// Maximum number of derived tags.
pub const MAX_TAGS: usize = 10;

const BASE_TAGS: [&str; 2] = ["crypto", "DeFi"];

/// Extra tags for well-known chains.
fn chain_aliases(chain: &str) -> &'static [&'static str] {
    match chain.to_ascii_lowercase().as_str() {
        "ethereum" | "eth" => &["ETH", "Ethereum"],
        "solana" | "sol" => &["SOL", "Solana"],
        "bsc" | "bnb" | "binance" => &["BNB", "BNBChain"],
        "arbitrum" => &["ARB", "Arbitrum"],
        "polygon" | "matic" => &["MATIC", "Polygon"],
        "optimism" => &["OP", "Optimism"],
        "avalanche" | "avax" => &["AVAX", "Avalanche"],
        "base" => &["Base"],
        _ => &[],
    }
}

fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Derive topical tags from a payload.
///
/// Base tags come first, then symbol, name, chain and its aliases, category,
/// and market/TVL markers. Duplicates are dropped (first occurrence wins) and
/// the result is capped at [`MAX_TAGS`].
pub fn derive_tags(data: &Value) -> Vec<String> {
    let shape = DataShape::new(data);
    let mut candidates: Vec<String> = BASE_TAGS.iter().map(|t| t.to_string()).collect();

    if let Some(symbol) = shape.token_symbol() {
        candidates.push(symbol);
    }
    if let Some(name) = shape.entity_name() {
        candidates.push(compact(name));
    }
    if let Some(chain) = shape.chain() {
        candidates.push(compact(chain));
        candidates.extend(chain_aliases(chain).iter().map(|t| t.to_string()));
    }
    if let Some(category) = shape.category() {
        candidates.push(compact(category));
    }
    if shape.array("topTokens").is_some_and(|t| t.len() > 1) {
        candidates.push("Altcoins".to_string());
    }
    if shape.array("topProtocols").is_some_and(|p| !p.is_empty()) {
        candidates.push("DeFiProtocols".to_string());
    }
    if shape.has_tvl_series() {
        candidates.push("TVL".to_string());
    }

    let mut tags: Vec<String> = Vec::with_capacity(MAX_TAGS);
    for tag in candidates {
        if tag.is_empty() || tags.contains(&tag) {
            continue;
        }
        tags.push(tag);
        if tags.len() == MAX_TAGS {
            break;
        }
    }
    tags
}

/// Render up to `cap` tags as `#tag` words joined by single spaces.
pub fn format_hashtags<S: AsRef<str>>(tags: &[S], cap: usize) -> String {
    tags.iter()
        .map(|t| compact(t.as_ref().trim_start_matches('#')))
        .filter(|t| !t.is_empty())
        .take(cap)
        .map(|t| format!("#{t}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_token_tags() {
        let data = json!({
            "token": {"symbol": "eth", "name": "Ethereum", "chain": "ethereum"},
            "price": {"usd": 2500.0}
        });
        assert_eq!(derive_tags(&data), vec!["crypto", "DeFi", "ETH", "Ethereum", "ethereum"]);
    }

    #[test]
    fn test_protocol_tags() {
        let data = json!({
            "protocol": {"name": "Curve Finance", "category": "Dexes", "chain": "Arbitrum"},
            "historicalTvl": [{"date": "2024-01-01", "tvl": 1.0}]
        });
        assert_eq!(
            derive_tags(&data),
            vec!["crypto", "DeFi", "CurveFinance", "Arbitrum", "ARB", "Dexes", "TVL"]
        );
    }

    #[test]
    fn test_market_tags() {
        let data = json!({
            "topTokens": [{"symbol": "ETH"}, {"symbol": "SOL"}],
            "topProtocols": [{"name": "Lido", "tvl": 1.0}]
        });
        assert_eq!(derive_tags(&data), vec!["crypto", "DeFi", "Altcoins", "DeFiProtocols"]);
    }

    #[test]
    fn test_tags_unique_and_capped() {
        let data = json!({
            "token": {"symbol": "crypto", "name": "De Fi", "chain": "ethereum"},
            "protocol": {"category": "Liquid Staking"},
            "topTokens": [{}, {}],
            "topProtocols": [{}],
            "historicalTvl": []
        });
        let tags = derive_tags(&data);
        assert!(tags.len() <= MAX_TAGS);
        let mut unique = tags.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), tags.len());
    }

    #[test]
    fn test_format_hashtags() {
        let tags = vec!["crypto", "DeFi", "Liquid Staking", "#ETH"];
        assert_eq!(format_hashtags(&tags, 10), "#crypto #DeFi #LiquidStaking #ETH");
        assert_eq!(format_hashtags(&tags, 2), "#crypto #DeFi");
        assert_eq!(format_hashtags(&tags, 0), "");
    }
}
