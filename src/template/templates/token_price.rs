//! Token price chart.
//!
//! Draws a token's price history with headline price, 24h change, volume and
//! liquidity cards.
//!
//! | option        | default                      |
//! |---------------|------------------------------|
//! | `width`       | 800                          |
//! | `height`      | 400                          |
//! | `colorScheme` | `dark`                       |
//! | `title`       | `"<SYMBOL> Price"`           |
//! | `showLegend`  | `false`                      |
//! | `fontFamily`  | system sans-serif stack      |
//! | `days`        | 30 (trailing history points) |

use super::{Defaults, frame, tail};
use crate::error::{Error, Result};
use crate::format;
use crate::render::Artifact;
use crate::template::html::{self, change_class, stat, stats};
use crate::template::{DataShape, Template, TemplateOptions};
use serde_json::Value;
use std::collections::BTreeSet;

const DEFAULTS: Defaults = Defaults {
    width: 800,
    height: 400,
    show_legend: false,
    days: 30,
};

/// Token price chart template.
#[derive(Debug, Default)]
pub struct TokenPriceTemplate;

impl TokenPriceTemplate {
    pub fn new() -> Self {
        Self
    }
}

impl Template for TokenPriceTemplate {
    fn id(&self) -> &str {
        "token-price-chart"
    }

    fn name(&self) -> &str {
        "Token Price Chart"
    }

    fn description(&self) -> &str {
        "Price history and 24h statistics for a single token"
    }

    fn suitable_for(&self) -> BTreeSet<String> {
        ["token", "price", "price-history"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn is_suitable_for(&self, data: &Value) -> bool {
        let shape = DataShape::new(data);
        shape.has_token_price() || shape.has_price_history()
    }

    fn generate(&self, data: &Value, options: &TemplateOptions) -> Result<Artifact> {
        if !self.is_suitable_for(data) {
            return Err(Error::UnsuitableTemplate(self.id().to_string()));
        }

        let shape = DataShape::new(data);
        let symbol = shape.token_symbol().unwrap_or_else(|| "TOKEN".to_string());
        let frame = frame(options, DEFAULTS, format!("{symbol} Price"));
        let days = options.days.unwrap_or(DEFAULTS.days);

        let mut cards = Vec::new();
        if let Some(price) = shape.number("price.usd") {
            cards.push(stat("Price", &format::usd_price(price), None));
        }
        if let Some(change) = shape.number("price.change24h") {
            cards.push(stat(
                "24h Change",
                &format::percent_change(change),
                Some(change_class(change)),
            ));
        }
        if let Some(volume) = shape.number("volume.usd24h") {
            cards.push(stat("24h Volume", &format::usd_compact(volume), None));
        }
        if let Some(liquidity) = shape.number("liquidity.usd") {
            cards.push(stat("Liquidity", &format::usd_compact(liquidity), None));
        }

        let history = tail(&shape.price_series(), days);
        let (labels, values): (Vec<String>, Vec<f64>) = history.into_iter().unzip();

        let trend_color = match shape.number("price.change24h") {
            Some(change) if change < 0.0 => frame.palette.negative,
            _ => frame.palette.accent,
        };

        let mut body = stats(&cards)?;
        body.push_str(&html::line_chart(
            &labels,
            &values,
            frame.width - 48,
            frame.height,
            trend_color,
            &frame.palette,
        )?);
        if frame.show_legend {
            body.push_str(&html::legend(&[(format!("{symbol}/USD"), trend_color)])?);
        }

        let subtitle = match (shape.entity_name(), shape.chain()) {
            (Some(name), Some(chain)) => Some(format!("{name} on {chain}")),
            (Some(name), None) => Some(name.to_string()),
            (None, Some(chain)) => Some(chain.to_string()),
            (None, None) => None,
        };

        Ok(Artifact::Markup(html::document(
            &frame,
            subtitle.as_deref(),
            &body,
            None,
        )?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eth() -> Value {
        json!({
            "token": {"symbol": "eth", "name": "Ethereum", "chain": "ethereum"},
            "price": {"usd": 2500.123456, "change24h": -1.5},
            "volume": {"usd24h": 1.2e9},
            "historicalPrices": [
                {"timestamp": "2024-01-01", "price": 2400.0},
                {"timestamp": "2024-01-02", "price": 2450.0},
                {"timestamp": "2024-01-03", "price": 2500.0}
            ]
        })
    }

    #[test]
    fn test_suitability() {
        let template = TokenPriceTemplate::new();
        assert!(template.is_suitable_for(&eth()));
        assert!(template.is_suitable_for(&json!({"historicalPrices": []})));
        assert!(!template.is_suitable_for(&json!({"historicalTvl": []})));
        assert!(!template.is_suitable_for(&json!({"price": {"usd": null}})));
    }

    #[test]
    fn test_generate_uses_defaults() {
        let artifact = TokenPriceTemplate::new()
            .generate(&eth(), &TemplateOptions::default())
            .unwrap();
        let Artifact::Markup(markup) = artifact else {
            panic!("expected markup");
        };

        assert!(markup.starts_with("<!DOCTYPE html>"));
        assert!(markup.contains("<title>ETH Price</title>"));
        assert!(markup.contains("$2,500.12"));
        assert!(markup.contains("-1.50%"));
        assert!(markup.contains("$1.20B"));
        assert!(markup.contains("Ethereum on ethereum"));
        assert!(markup.contains("width: 800px"));
        assert!(markup.contains("<svg"));
    }

    #[test]
    fn test_generate_respects_days_and_title() {
        let options = TemplateOptions {
            days: Some(1),
            title: Some("Ether today".to_string()),
            ..Default::default()
        };
        let Artifact::Markup(markup) = TokenPriceTemplate::new().generate(&eth(), &options).unwrap()
        else {
            panic!("expected markup");
        };
        assert!(markup.contains("<title>Ether today</title>"));
        assert!(!markup.contains("2024-01-01"));
        assert!(markup.contains("2024-01-03"));
    }

    #[test]
    fn test_generate_escapes_payload_text() {
        let mut data = eth();
        data["token"]["name"] = json!("<img src=x onerror=alert(1)>");
        let Artifact::Markup(markup) = TokenPriceTemplate::new()
            .generate(&data, &TemplateOptions::default())
            .unwrap()
        else {
            panic!("expected markup");
        };
        assert!(!markup.contains("<img"));
        assert!(markup.contains("&lt;img"));
    }

    #[test]
    fn test_generate_rejects_style_breakout_in_font_family() {
        let options = TemplateOptions {
            font_family: Some("x; }</style><script>alert(1)</script><style>".to_string()),
            ..Default::default()
        };
        let err = TokenPriceTemplate::new().generate(&eth(), &options).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        let options = TemplateOptions {
            font_family: Some("'Inter', sans-serif".to_string()),
            ..Default::default()
        };
        let Artifact::Markup(markup) = TokenPriceTemplate::new().generate(&eth(), &options).unwrap()
        else {
            panic!("expected markup");
        };
        assert!(markup.contains("font-family: 'Inter', sans-serif;"));
    }

    #[test]
    fn test_generate_rejects_unsuitable_data() {
        let err = TokenPriceTemplate::new()
            .generate(&json!({"topTokens": []}), &TemplateOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnsuitableTemplate(_)));
    }
}
