//! Built-in visualization templates.

mod market_overview;
mod protocol_tvl;
mod token_price;
mod tvl_distribution;

pub use market_overview::MarketOverviewTemplate;
pub use protocol_tvl::ProtocolTvlTemplate;
pub use token_price::TokenPriceTemplate;
pub use tvl_distribution::TvlDistributionTemplate;

use super::html::Frame;
use super::TemplateOptions;

/// Per-template fallbacks for options the caller left out.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Defaults {
    pub width: u32,
    pub height: u32,
    pub show_legend: bool,
    pub days: u32,
}

pub(crate) const DEFAULT_FONT: &str =
    "-apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif";

/// Resolve layout from caller options over template defaults.
pub(crate) fn frame(options: &TemplateOptions, defaults: Defaults, title: String) -> Frame {
    Frame {
        title: options.title.clone().unwrap_or(title),
        width: options.width.unwrap_or(defaults.width).max(320),
        height: options.height.unwrap_or(defaults.height).max(200),
        palette: options.color_scheme.unwrap_or_default().palette(),
        font_family: options
            .font_family
            .clone()
            .unwrap_or_else(|| DEFAULT_FONT.to_string()),
        show_legend: options.show_legend.unwrap_or(defaults.show_legend),
    }
}

/// Keep the trailing `days` points of a daily series.
pub(crate) fn tail<T: Clone>(points: &[T], days: u32) -> Vec<T> {
    let keep = (days as usize).min(points.len());
    points[points.len() - keep..].to_vec()
}
