//! Market overview dashboard.
//!
//! Tables of top tokens and top protocols, with a TVL bar chart of the
//! protocols when present.
//!
//! | option        | default                   |
//! |---------------|---------------------------|
//! | `width`       | 1000                      |
//! | `height`      | 600                       |
//! | `colorScheme` | `dark`                    |
//! | `title`       | `"DeFi Market Overview"`  |
//! | `showLegend`  | `false`                   |
//! | `fontFamily`  | system sans-serif stack   |
//! | `days`        | unused                    |
//!
//! Extended option `limit` (number) caps rows per table, default 10.

use super::{Defaults, frame};
use crate::error::{Error, Result};
use crate::format;
use crate::render::Artifact;
use crate::template::html::{self, change_class, stat, stats};
use crate::template::{DataShape, Template, TemplateOptions};
use askama::Template as Markup;
use serde_json::Value;
use std::collections::BTreeSet;

const DEFAULTS: Defaults = Defaults {
    width: 1000,
    height: 600,
    show_legend: false,
    days: 0,
};

const DEFAULT_LIMIT: usize = 10;

struct TokenRow {
    rank: usize,
    symbol: String,
    price: String,
    class: &'static str,
    change: String,
    volume: String,
}

#[derive(Markup)]
#[template(path = "token_table.html", escape = "html")]
struct TokenTable {
    heading: &'static str,
    rows: Vec<TokenRow>,
}

/// Multi-entity market overview template.
#[derive(Debug, Default)]
pub struct MarketOverviewTemplate;

impl MarketOverviewTemplate {
    pub fn new() -> Self {
        Self
    }

    fn token_table(tokens: &[Value], limit: usize) -> Result<String> {
        let rows = tokens
            .iter()
            .take(limit)
            .enumerate()
            .map(|(i, token)| {
                let row = DataShape::new(token);
                let change = row
                    .number("change24h")
                    .or_else(|| row.number("price.change24h"));
                TokenRow {
                    rank: i + 1,
                    symbol: row
                        .string("symbol")
                        .or_else(|| row.string("token.symbol"))
                        .unwrap_or("?")
                        .to_uppercase(),
                    price: row
                        .number("price")
                        .or_else(|| row.number("price.usd"))
                        .map(format::usd_price)
                        .unwrap_or_default(),
                    class: change.map(change_class).unwrap_or(""),
                    change: change.map(format::percent_change).unwrap_or_default(),
                    volume: row
                        .number("volume24h")
                        .or_else(|| row.number("volume.usd24h"))
                        .map(format::usd_compact)
                        .unwrap_or_default(),
                }
            })
            .collect();

        let table = TokenTable {
            heading: "Top Tokens",
            rows,
        };
        Ok(table.render()?)
    }

    fn protocol_rows(protocols: &[Value], limit: usize) -> Vec<(String, f64)> {
        protocols
            .iter()
            .take(limit)
            .filter_map(|p| {
                let row = DataShape::new(p);
                Some((row.string("name")?.to_string(), row.number("tvl")?))
            })
            .collect()
    }
}

impl Template for MarketOverviewTemplate {
    fn id(&self) -> &str {
        "market-overview"
    }

    fn name(&self) -> &str {
        "Market Overview"
    }

    fn description(&self) -> &str {
        "Top tokens and protocols across the market"
    }

    fn suitable_for(&self) -> BTreeSet<String> {
        ["market", "top-tokens", "top-protocols"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn is_suitable_for(&self, data: &Value) -> bool {
        let shape = DataShape::new(data);
        shape.has_top_tokens() || shape.has_top_protocols()
    }

    fn generate(&self, data: &Value, options: &TemplateOptions) -> Result<Artifact> {
        if !self.is_suitable_for(data) {
            return Err(Error::UnsuitableTemplate(self.id().to_string()));
        }

        let shape = DataShape::new(data);
        let frame = frame(options, DEFAULTS, "DeFi Market Overview".to_string());
        let limit = options
            .extra("limit")
            .and_then(Value::as_u64)
            .map_or(DEFAULT_LIMIT, |l| l as usize);

        let mut cards = Vec::new();
        if let Some(total) = shape.number("totalTvl") {
            cards.push(stat("Total TVL", &format::usd_compact(total), None));
        }
        if let Some(change) = shape.number("totalTvlChange24h") {
            cards.push(stat(
                "24h Change",
                &format::percent_change(change),
                Some(change_class(change)),
            ));
        }
        let mut body = stats(&cards)?;

        if let Some(tokens) = shape.array("topTokens").filter(|t| !t.is_empty()) {
            body.push_str(&Self::token_table(tokens, limit)?);
        }

        if let Some(protocols) = shape.array("topProtocols") {
            let rows = Self::protocol_rows(protocols, limit);
            if !rows.is_empty() {
                body.push_str("<h2>Top Protocols by TVL</h2>");
                body.push_str(&html::bar_chart(
                    &rows,
                    frame.width - 48,
                    &frame.palette,
                    format::usd_compact,
                )?);
                if frame.show_legend {
                    let entries: Vec<(String, &str)> = rows
                        .iter()
                        .enumerate()
                        .map(|(i, (name, _))| {
                            (name.clone(), frame.palette.series[i % frame.palette.series.len()])
                        })
                        .collect();
                    body.push_str(&html::legend(&entries)?);
                }
            }
        }

        let footer = shape.string("updatedAt").map(|updated| format!("Updated {updated}"));
        Ok(Artifact::Markup(html::document(
            &frame,
            None,
            &body,
            footer.as_deref(),
        )?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn overview() -> Value {
        json!({
            "totalTvl": 9.5e10,
            "topTokens": [
                {"symbol": "eth", "price": 2500.0, "change24h": 1.25, "volume24h": 1.2e9},
                {"symbol": "sol", "price": 100.0, "change24h": -3.0}
            ],
            "topProtocols": [
                {"name": "Lido", "tvl": 3.0e10},
                {"name": "Aave", "tvl": 1.1e10},
                {"name": "broken"}
            ]
        })
    }

    #[test]
    fn test_suitability() {
        let template = MarketOverviewTemplate::new();
        assert!(template.is_suitable_for(&overview()));
        assert!(template.is_suitable_for(&json!({"topProtocols": []})));
        assert!(!template.is_suitable_for(&json!({"topTokens": "many"})));
    }

    #[test]
    fn test_generate() {
        let Artifact::Markup(markup) = MarketOverviewTemplate::new()
            .generate(&overview(), &TemplateOptions::default())
            .unwrap()
        else {
            panic!("expected markup");
        };

        assert!(markup.contains("DeFi Market Overview"));
        assert!(markup.contains("$95.00B"));
        assert!(markup.contains("<td>ETH</td>"));
        assert!(markup.contains("-3.00%"));
        assert!(markup.contains("Lido"));
        assert!(!markup.contains("broken"));
    }

    #[test]
    fn test_limit_extended_option() {
        let mut options = TemplateOptions::default();
        options.extra.insert("limit".to_string(), json!(1));
        let Artifact::Markup(markup) = MarketOverviewTemplate::new()
            .generate(&overview(), &options)
            .unwrap()
        else {
            panic!("expected markup");
        };
        assert!(markup.contains("<td>ETH</td>"));
        assert!(!markup.contains("<td>SOL</td>"));
        assert!(!markup.contains("Aave"));
    }

    #[test]
    fn test_generate_escapes_symbols_and_footer() {
        let data = json!({
            "topTokens": [{"symbol": "<script>x</script>", "price": 1.0}],
            "updatedAt": "<b>now</b>"
        });
        let Artifact::Markup(markup) = MarketOverviewTemplate::new()
            .generate(&data, &TemplateOptions::default())
            .unwrap()
        else {
            panic!("expected markup");
        };
        assert!(!markup.contains("<SCRIPT>"));
        assert!(markup.contains("&lt;SCRIPT&gt;"));
        assert!(markup.contains("Updated &lt;b&gt;now"));
    }

    #[test]
    fn test_generate_rejects_style_breakout_in_font_family() {
        let options = TemplateOptions {
            font_family: Some("x; }</style><script>alert(1)</script><style>".to_string()),
            ..Default::default()
        };
        let err = MarketOverviewTemplate::new()
            .generate(&overview(), &options)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
