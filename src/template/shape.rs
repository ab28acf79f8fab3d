//! Optional-field view over visualization payloads.
//!
//! Payloads arrive as untyped JSON. Every structural check the templates and
//! the content formatter need lives here, so suitability checks stay pure
//! functions over a single well-defined view instead of ad hoc lookups.

use serde_json::Value;

/// Borrowed view over a visualization payload.
#[derive(Debug, Clone, Copy)]
pub struct DataShape<'a> {
    data: &'a Value,
}

/// Coarse classification of a payload, used for prose selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// A single token snapshot (`token`, `price`, `volume`).
    Token,
    /// A single protocol snapshot or TVL series.
    Protocol,
    /// A multi-entity overview (`topTokens`, `topProtocols`, `chains`).
    Market,
    /// Anything else.
    Unknown,
}

impl<'a> DataShape<'a> {
    pub fn new(data: &'a Value) -> Self {
        Self { data }
    }

    pub fn raw(&self) -> &'a Value {
        self.data
    }

    /// Look up a dotted path (`price.usd`).
    pub fn path(&self, path: &str) -> Option<&'a Value> {
        path.split('.')
            .try_fold(self.data, |node, key| node.as_object()?.get(key))
    }

    pub fn number(&self, path: &str) -> Option<f64> {
        self.path(path).and_then(Value::as_f64)
    }

    pub fn string(&self, path: &str) -> Option<&'a str> {
        self.path(path)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn array(&self, path: &str) -> Option<&'a Vec<Value>> {
        self.path(path).and_then(Value::as_array)
    }

    /// Token snapshot: numeric `price.usd`.
    pub fn has_token_price(&self) -> bool {
        self.number("price.usd").is_some()
    }

    /// Token price history: array-valued `historicalPrices`.
    pub fn has_price_history(&self) -> bool {
        self.array("historicalPrices").is_some()
    }

    /// TVL series: array-valued `historicalTvl`.
    pub fn has_tvl_series(&self) -> bool {
        self.array("historicalTvl").is_some()
    }

    pub fn has_top_tokens(&self) -> bool {
        self.array("topTokens").is_some()
    }

    pub fn has_top_protocols(&self) -> bool {
        self.array("topProtocols").is_some()
    }

    /// Distribution rows: `chains` or `categories` holding objects with numeric `tvl`.
    pub fn has_tvl_distribution(&self) -> bool {
        ["chains", "categories"].iter().any(|key| {
            self.array(key).is_some_and(|rows| {
                !rows.is_empty() && rows.iter().all(|row| row.get("tvl").is_some_and(Value::is_number))
            })
        })
    }

    pub fn kind(&self) -> ShapeKind {
        if self.string("token.symbol").is_some() || self.has_token_price() {
            ShapeKind::Token
        } else if self.path("protocol").is_some() || self.has_tvl_series() {
            ShapeKind::Protocol
        } else if self.has_top_tokens() || self.has_top_protocols() || self.has_tvl_distribution() {
            ShapeKind::Market
        } else {
            ShapeKind::Unknown
        }
    }

    /// Token symbol, upper-cased.
    pub fn token_symbol(&self) -> Option<String> {
        self.string("token.symbol").map(str::to_uppercase)
    }

    /// Entity name: token name, then protocol name, then top-level `name`.
    pub fn entity_name(&self) -> Option<&'a str> {
        self.string("token.name")
            .or_else(|| self.string("protocol.name"))
            .or_else(|| self.string("name"))
    }

    /// Chain: token chain, then protocol chain, then top-level `chain`.
    pub fn chain(&self) -> Option<&'a str> {
        self.string("token.chain")
            .or_else(|| self.string("protocol.chain"))
            .or_else(|| self.string("chain"))
    }

    pub fn category(&self) -> Option<&'a str> {
        self.string("protocol.category")
            .or_else(|| self.string("category"))
    }

    /// Current TVL: protocol TVL, then top-level `tvl`, then last series point.
    pub fn current_tvl(&self) -> Option<f64> {
        self.number("protocol.tvl")
            .or_else(|| self.number("tvl"))
            .or_else(|| {
                self.tvl_series()
                    .last()
                    .map(|(_, value)| *value)
            })
    }

    /// `(label, price)` pairs from `historicalPrices`.
    pub fn price_series(&self) -> Vec<(String, f64)> {
        series(self.array("historicalPrices"), &["timestamp", "date"], &["price", "value"])
    }

    /// `(label, tvl)` pairs from `historicalTvl`.
    pub fn tvl_series(&self) -> Vec<(String, f64)> {
        series(self.array("historicalTvl"), &["date", "timestamp"], &["tvl", "value"])
    }

    /// `(name, tvl)` rows from `chains` or `categories`.
    pub fn distribution(&self, key: &str) -> Vec<(String, f64)> {
        self.array(key)
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| {
                        let name = row
                            .get("name")
                            .or_else(|| row.get("category"))
                            .and_then(Value::as_str)?;
                        let tvl = row.get("tvl").and_then(Value::as_f64)?;
                        Some((name.to_string(), tvl))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn series(rows: Option<&Vec<Value>>, label_keys: &[&str], value_keys: &[&str]) -> Vec<(String, f64)> {
    let Some(rows) = rows else {
        return Vec::new();
    };

    rows.iter()
        .filter_map(|row| {
            let value = value_keys
                .iter()
                .find_map(|k| row.get(*k).and_then(Value::as_f64))?;
            let label = label_keys
                .iter()
                .find_map(|k| row.get(*k))
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .unwrap_or_default();
            Some((label, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_lookup() {
        let data = json!({"price": {"usd": 2500.5}, "token": {"symbol": " eth "}});
        let shape = DataShape::new(&data);
        assert_eq!(shape.number("price.usd"), Some(2500.5));
        assert_eq!(shape.token_symbol(), Some("ETH".to_string()));
        assert!(shape.path("price.missing").is_none());
        assert!(shape.path("token.symbol.deeper").is_none());
    }

    #[test]
    fn test_kind_detection() {
        assert_eq!(DataShape::new(&json!({"price": {"usd": 1.0}})).kind(), ShapeKind::Token);
        assert_eq!(
            DataShape::new(&json!({"historicalTvl": []})).kind(),
            ShapeKind::Protocol
        );
        assert_eq!(DataShape::new(&json!({"topTokens": []})).kind(), ShapeKind::Market);
        assert_eq!(DataShape::new(&json!({"foo": 1})).kind(), ShapeKind::Unknown);
        assert_eq!(DataShape::new(&json!([1, 2])).kind(), ShapeKind::Unknown);
    }

    #[test]
    fn test_non_numeric_price_is_not_token_price() {
        let data = json!({"price": {"usd": "2500"}});
        assert!(!DataShape::new(&data).has_token_price());
    }

    #[test]
    fn test_tvl_series_accepts_both_key_styles() {
        let data = json!({"historicalTvl": [
            {"date": "2024-01-01", "tvl": 100},
            {"timestamp": 1704153600, "value": 110.5},
            {"date": "2024-01-03"}
        ]});
        let series = DataShape::new(&data).tvl_series();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0], ("2024-01-01".to_string(), 100.0));
        assert_eq!(series[1], ("1704153600".to_string(), 110.5));
    }

    #[test]
    fn test_distribution_requires_numeric_tvl() {
        let good = json!({"chains": [{"name": "Ethereum", "tvl": 5.0e10}]});
        let bad = json!({"chains": [{"name": "Ethereum", "tvl": "lots"}]});
        assert!(DataShape::new(&good).has_tvl_distribution());
        assert!(!DataShape::new(&bad).has_tvl_distribution());
    }
}
