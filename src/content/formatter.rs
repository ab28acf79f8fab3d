//! Platform-ready post text.
//!
//! Prose is built from the payload shape, then fitted to the platform's
//! character limit together with its hashtags. Prose is truncated with a `…`
//! marker when needed; hashtags never are.

use super::platforms::{ContentType, PlatformSpec};
use super::tags::{derive_tags, format_hashtags};
use crate::format;
use crate::template::{DataShape, ShapeKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write;

const ELLIPSIS: char = '…';
const TAG_SEPARATOR: &str = "\n\n";
/// Rows listed per section in detailed and thread market posts.
const LIST_ROWS: usize = 5;

/// Formatted content for one platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformContent {
    pub platform: String,
    pub content_type: ContentType,
    /// The post text. For threads this is the first entry.
    pub message: String,
    /// Tags attached to the post, already capped for the platform.
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread: Option<Vec<String>>,
}

/// Format `data` for `platform`.
///
/// An unsupported `requested` type degrades (thread, detailed, short) to the
/// first type the platform supports.
pub fn format_content(
    data: &Value,
    platform: &PlatformSpec,
    requested: ContentType,
) -> PlatformContent {
    let content_type = platform.resolve_content_type(requested);
    let cap = platform.hashtag_limit(content_type);
    let tags: Vec<String> = derive_tags(data).into_iter().take(cap).collect();
    let prose = Prose::new(DataShape::new(data));
    let limit = platform.char_limit;

    let (message, thread) = match content_type {
        ContentType::Short => (compose(&prose.short(), tags.as_slice(), limit), None),
        ContentType::Detailed => (compose(&prose.detailed(), tags.as_slice(), limit), None),
        ContentType::Thread => {
            let entries = prose.thread();
            let total = entries.len();
            let thread: Vec<String> = entries
                .iter()
                .enumerate()
                .map(|(i, entry)| {
                    let body = format!("{}/{total} {entry}", i + 1);
                    if i + 1 == total {
                        compose(&body, tags.as_slice(), limit)
                    } else {
                        compose(&body, &[] as &[String], limit)
                    }
                })
                .collect();
            (thread.first().cloned().unwrap_or_default(), Some(thread))
        }
    };

    PlatformContent {
        platform: platform.id.to_string(),
        content_type,
        message,
        tags,
        thread,
    }
}

/// Fit a caller-supplied message and tags to `platform` using its default
/// content type's hashtag cap.
pub fn format_message<S: AsRef<str>>(message: &str, tags: &[S], platform: &PlatformSpec) -> String {
    let cap = platform.hashtag_limit(platform.default_content_type());
    let tags: Vec<&str> = tags.iter().map(AsRef::as_ref).take(cap).collect();
    compose(message, tags.as_slice(), platform.char_limit)
}

/// Join prose and hashtags within `limit` characters.
///
/// Trailing tags are dropped only when the hashtags alone cannot fit.
pub fn compose<S: AsRef<str>>(body: &str, tags: &[S], limit: usize) -> String {
    let body = body.trim_end();
    let mut cap = tags.len();
    let hashtags = loop {
        let hashtags = format_hashtags(tags, cap);
        let reserved = hashtags.chars().count() + TAG_SEPARATOR.len() + 1;
        if hashtags.is_empty() || reserved <= limit {
            break hashtags;
        }
        cap -= 1;
    };

    let separator = if hashtags.is_empty() || body.is_empty() {
        ""
    } else {
        TAG_SEPARATOR
    };
    let total = body.chars().count() + separator.len() + hashtags.chars().count();
    if total <= limit {
        return format!("{body}{separator}{hashtags}");
    }

    let budget = limit.saturating_sub(separator.len() + hashtags.chars().count() + 1);
    let prose: String = body.chars().take(budget).collect();
    let separator = if hashtags.is_empty() { "" } else { TAG_SEPARATOR };
    format!("{}{ELLIPSIS}{separator}{hashtags}", prose.trim_end())
}

/// Prose builders over one payload.
struct Prose<'a> {
    shape: DataShape<'a>,
}

impl<'a> Prose<'a> {
    fn new(shape: DataShape<'a>) -> Self {
        Self { shape }
    }

    fn short(&self) -> String {
        match self.shape.kind() {
            ShapeKind::Token => self.token_headline(),
            ShapeKind::Protocol => self.protocol_headline(),
            ShapeKind::Market => self.market_headline(),
            ShapeKind::Unknown => "📊 Fresh market data, visualized.".to_string(),
        }
    }

    fn detailed(&self) -> String {
        match self.shape.kind() {
            ShapeKind::Token => self.token_detailed(),
            ShapeKind::Protocol => self.protocol_detailed(),
            ShapeKind::Market => self.market_detailed(),
            ShapeKind::Unknown => {
                "📊 Fresh market data, visualized.\n\nFull chart attached.".to_string()
            }
        }
    }

    fn thread(&self) -> Vec<String> {
        let mut entries = match self.shape.kind() {
            ShapeKind::Token => self.token_thread(),
            ShapeKind::Protocol => self.protocol_thread(),
            ShapeKind::Market => self.market_thread(),
            ShapeKind::Unknown => vec!["📊 Fresh market data, visualized. 🧵".to_string()],
        };
        entries.push("Full chart attached. What are you watching next?".to_string());
        entries
    }

    // Token

    fn symbol(&self) -> String {
        self.shape
            .token_symbol()
            .or_else(|| self.shape.entity_name().map(str::to_uppercase))
            .unwrap_or_else(|| "TOKEN".to_string())
    }

    fn price(&self) -> Option<f64> {
        self.shape
            .number("price.usd")
            .or_else(|| self.shape.price_series().last().map(|(_, p)| *p))
    }

    fn token_headline(&self) -> String {
        let change = self.shape.number("price.change24h");
        let mut out = format!(
            "{} ${}",
            format::trend_arrow(change.unwrap_or(0.0)),
            self.symbol()
        );
        match self.price() {
            Some(price) => {
                let _ = write!(out, " is trading at {}", format::usd_price(price));
            }
            None => out.push_str(" market update"),
        }
        if let Some(change) = change {
            let _ = write!(out, " ({} 24h)", format::percent_change(change));
        }
        if let Some(volume) = self.shape.number("volume.usd24h") {
            let _ = write!(out, " · Vol {}", format::usd_compact(volume));
        }
        out
    }

    fn token_stats(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(price) = self.price() {
            lines.push(format!("💰 Price: {}", format::usd_price(price)));
        }
        if let Some(change) = self.shape.number("price.change24h") {
            lines.push(format!(
                "{} 24h change: {}",
                format::trend_arrow(change),
                format::percent_change(change)
            ));
        }
        if let Some(volume) = self.shape.number("volume.usd24h") {
            lines.push(format!("📦 24h volume: {}", format::usd_compact(volume)));
        }
        if let Some(liquidity) = self.shape.number("liquidity.usd") {
            lines.push(format!("💧 Liquidity: {}", format::usd_compact(liquidity)));
        }
        lines
    }

    fn price_trend(&self) -> Option<String> {
        let series = self.shape.price_series();
        let (first, last) = (series.first()?.1, series.last()?.1);
        if series.len() < 2 || first <= 0.0 {
            return None;
        }
        Some(format!(
            "Across {} data points ${} moved {} ({} → {}).",
            series.len(),
            self.symbol(),
            format::percent_change((last - first) / first * 100.0),
            format::usd_price(first),
            format::usd_price(last)
        ))
    }

    fn token_detailed(&self) -> String {
        let title = match self.shape.entity_name() {
            Some(name) => format!("📊 {name} (${}) market update", self.symbol()),
            None => format!("📊 ${} market update", self.symbol()),
        };
        let mut out = title;
        out.push_str("\n\n");
        out.push_str(&self.token_stats().join("\n"));
        if let Some(chain) = self.shape.chain() {
            let _ = write!(out, "\n⛓️ Chain: {chain}");
        }
        if let Some(trend) = self.price_trend() {
            let _ = write!(out, "\n\n{trend}");
        }
        out.push_str("\n\nFull chart attached.");
        out
    }

    fn token_thread(&self) -> Vec<String> {
        let mut entries = vec![format!("{} 🧵", self.token_headline())];
        let activity: Vec<String> = self
            .token_stats()
            .into_iter()
            .filter(|line| line.starts_with("📦") || line.starts_with("💧"))
            .collect();
        if !activity.is_empty() {
            entries.push(format!("Activity\n\n{}", activity.join("\n")));
        }
        if let Some(trend) = self.price_trend() {
            entries.push(format!("Trend\n\n{trend}"));
        }
        entries
    }

    // Protocol

    fn protocol_name(&self) -> &'a str {
        self.shape
            .entity_name()
            .or_else(|| self.shape.chain())
            .unwrap_or("DeFi")
    }

    fn tvl_change(&self) -> Option<f64> {
        self.shape
            .number("change1d")
            .or_else(|| self.shape.number("protocol.change1d"))
    }

    fn protocol_headline(&self) -> String {
        let mut out = format!("🏦 {} TVL", self.protocol_name());
        if let Some(tvl) = self.shape.current_tvl() {
            let _ = write!(out, ": {}", format::usd_compact(tvl));
        }
        if let Some(change) = self.tvl_change() {
            let _ = write!(out, " ({} 24h)", format::percent_change(change));
        }
        out
    }

    fn tvl_trend(&self) -> Option<String> {
        let series = self.shape.tvl_series();
        let (first, last) = (series.first()?, series.last()?);
        if series.len() < 2 || first.1 <= 0.0 {
            return None;
        }
        Some(format!(
            "TVL went from {} on {} to {} on {}, {} over the period.",
            format::usd_compact(first.1),
            first.0,
            format::usd_compact(last.1),
            last.0,
            format::percent_change((last.1 - first.1) / first.1 * 100.0)
        ))
    }

    fn protocol_context(&self) -> Option<String> {
        let chains: Vec<&str> = self
            .shape
            .array("protocol.chains")
            .map(|c| c.iter().filter_map(Value::as_str).take(LIST_ROWS).collect())
            .unwrap_or_default();
        let mut lines = Vec::new();
        if let Some(category) = self.shape.category() {
            lines.push(format!("🏷️ Category: {category}"));
        }
        if !chains.is_empty() {
            lines.push(format!("⛓️ Chains: {}", chains.join(", ")));
        } else if let Some(chain) = self.shape.chain() {
            lines.push(format!("⛓️ Chain: {chain}"));
        }
        (!lines.is_empty()).then(|| lines.join("\n"))
    }

    fn protocol_detailed(&self) -> String {
        let mut out = format!("📊 {} update\n\n", self.protocol_name());
        if let Some(tvl) = self.shape.current_tvl() {
            let _ = writeln!(out, "🔒 TVL: {}", format::usd_compact(tvl));
        }
        if let Some(change) = self.tvl_change() {
            let _ = writeln!(
                out,
                "{} 24h change: {}",
                format::trend_arrow(change),
                format::percent_change(change)
            );
        }
        if let Some(context) = self.protocol_context() {
            let _ = writeln!(out, "{context}");
        }
        if let Some(trend) = self.tvl_trend() {
            let _ = write!(out, "\n{trend}\n");
        }
        out.push_str("\nFull chart attached.");
        out
    }

    fn protocol_thread(&self) -> Vec<String> {
        let mut entries = vec![format!("{} 🧵", self.protocol_headline())];
        if let Some(trend) = self.tvl_trend() {
            entries.push(format!("Trend\n\n{trend}"));
        }
        if let Some(context) = self.protocol_context() {
            entries.push(format!("Context\n\n{context}"));
        }
        entries
    }

    // Market

    fn token_rows(&self) -> Vec<(String, Option<f64>, Option<f64>)> {
        self.shape
            .array("topTokens")
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| {
                        let row = DataShape::new(row);
                        let symbol = row
                            .string("symbol")
                            .or_else(|| row.string("token.symbol"))?
                            .to_uppercase();
                        let price = row.number("price").or_else(|| row.number("price.usd"));
                        let change = row
                            .number("change24h")
                            .or_else(|| row.number("price.change24h"));
                        Some((symbol, price, change))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn protocol_rows(&self) -> Vec<(String, f64)> {
        self.shape
            .array("topProtocols")
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| {
                        let row = DataShape::new(row);
                        Some((row.string("name")?.to_string(), row.number("tvl")?))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn top_mover(&self) -> Option<(String, f64)> {
        self.token_rows()
            .into_iter()
            .filter_map(|(symbol, _, change)| Some((symbol, change?)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }

    fn market_headline(&self) -> String {
        let mut parts = vec!["🌐 DeFi market snapshot".to_string()];
        if let Some(total) = self.shape.number("totalTvl") {
            parts.push(format!("total TVL {}", format::usd_compact(total)));
        }
        if let Some((name, tvl)) = self.protocol_rows().into_iter().next() {
            parts.push(format!("top protocol {name} ({})", format::usd_compact(tvl)));
        }
        if let Some((symbol, change)) = self.top_mover() {
            parts.push(format!(
                "top mover ${symbol} {}",
                format::percent_change(change)
            ));
        }
        if let Some((name, tvl)) = self.distribution_rows().into_iter().next() {
            parts.push(format!("largest: {name} ({})", format::usd_compact(tvl)));
        }
        parts.join(" · ")
    }

    fn distribution_rows(&self) -> Vec<(String, f64)> {
        let mut rows = self.shape.distribution("chains");
        if rows.is_empty() {
            rows = self.shape.distribution("categories");
        }
        rows.sort_by(|a, b| b.1.total_cmp(&a.1));
        rows
    }

    fn token_list(&self) -> Option<String> {
        let rows = self.token_rows();
        if rows.is_empty() {
            return None;
        }
        let lines: Vec<String> = rows
            .into_iter()
            .take(LIST_ROWS)
            .enumerate()
            .map(|(i, (symbol, price, change))| {
                let mut line = format!("{}. ${symbol}", i + 1);
                if let Some(price) = price {
                    let _ = write!(line, " {}", format::usd_price(price));
                }
                if let Some(change) = change {
                    let _ = write!(line, " ({})", format::percent_change(change));
                }
                line
            })
            .collect();
        Some(format!("🪙 Top tokens\n{}", lines.join("\n")))
    }

    fn ranked(title: &str, rows: Vec<(String, f64)>) -> Option<String> {
        if rows.is_empty() {
            return None;
        }
        let lines: Vec<String> = rows
            .into_iter()
            .take(LIST_ROWS)
            .enumerate()
            .map(|(i, (name, tvl))| format!("{}. {name} {}", i + 1, format::usd_compact(tvl)))
            .collect();
        Some(format!("{title}\n{}", lines.join("\n")))
    }

    fn market_sections(&self) -> Vec<String> {
        [
            self.token_list(),
            Self::ranked("🏦 Top protocols by TVL", self.protocol_rows()),
            Self::ranked("⛓️ TVL distribution", self.distribution_rows()),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn market_detailed(&self) -> String {
        let mut out = String::from("📊 DeFi market overview");
        if let Some(total) = self.shape.number("totalTvl") {
            let _ = write!(out, "\n\n🔒 Total TVL: {}", format::usd_compact(total));
        }
        for section in self.market_sections() {
            let _ = write!(out, "\n\n{section}");
        }
        out.push_str("\n\nFull chart attached.");
        out
    }

    fn market_thread(&self) -> Vec<String> {
        let mut entries = vec![format!("{} 🧵", self.market_headline())];
        entries.extend(self.market_sections());
        entries
    }
}
