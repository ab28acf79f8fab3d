//! Protocol TVL chart.
//!
//! | option        | default                           |
//! |---------------|-----------------------------------|
//! | `width`       | 900                               |
//! | `height`      | 420                               |
//! | `colorScheme` | `dark`                            |
//! | `title`       | `"<Protocol> TVL"` or `"TVL Trend"` |
//! | `showLegend`  | `true`                            |
//! | `fontFamily`  | system sans-serif stack           |
//! | `days`        | 90                                |

use super::{Defaults, frame, tail};
use crate::error::{Error, Result};
use crate::format;
use crate::render::Artifact;
use crate::template::html::{self, change_class, stat, stats};
use crate::template::{DataShape, Template, TemplateOptions};
use serde_json::Value;
use std::collections::BTreeSet;

const DEFAULTS: Defaults = Defaults {
    width: 900,
    height: 420,
    show_legend: true,
    days: 90,
};

/// Protocol (or chain) TVL history template.
#[derive(Debug, Default)]
pub struct ProtocolTvlTemplate;

impl ProtocolTvlTemplate {
    pub fn new() -> Self {
        Self
    }
}

impl Template for ProtocolTvlTemplate {
    fn id(&self) -> &str {
        "protocol-tvl-chart"
    }

    fn name(&self) -> &str {
        "Protocol TVL Chart"
    }

    fn description(&self) -> &str {
        "Total value locked over time for a protocol or chain"
    }

    fn suitable_for(&self) -> BTreeSet<String> {
        ["protocol", "tvl", "tvl-history"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn is_suitable_for(&self, data: &Value) -> bool {
        DataShape::new(data).has_tvl_series()
    }

    fn generate(&self, data: &Value, options: &TemplateOptions) -> Result<Artifact> {
        if !self.is_suitable_for(data) {
            return Err(Error::UnsuitableTemplate(self.id().to_string()));
        }

        let shape = DataShape::new(data);
        let name = shape.entity_name().or_else(|| shape.chain());
        let default_title = name.map_or_else(|| "TVL Trend".to_string(), |n| format!("{n} TVL"));
        let frame = frame(options, DEFAULTS, default_title);
        let days = options.days.unwrap_or(DEFAULTS.days);

        let series = tail(&shape.tvl_series(), days);
        let (labels, values): (Vec<String>, Vec<f64>) = series.into_iter().unzip();

        let mut cards = Vec::new();
        if let Some(tvl) = shape.current_tvl() {
            cards.push(stat("Current TVL", &format::usd_compact(tvl), None));
        }
        let change = shape
            .number("change1d")
            .or_else(|| shape.number("protocol.change1d"));
        if let Some(change) = change {
            cards.push(stat(
                "24h Change",
                &format::percent_change(change),
                Some(change_class(change)),
            ));
        }
        if let (Some(first), Some(last)) = (values.first(), values.last()) {
            if *first > 0.0 {
                let period = (last - first) / first * 100.0;
                cards.push(stat(
                    &format!("{}-point change", values.len()),
                    &format::percent_change(period),
                    Some(change_class(period)),
                ));
            }
        }

        let color = frame.palette.series[0];
        let mut body = stats(&cards)?;
        body.push_str(&html::line_chart(
            &labels,
            &values,
            frame.width - 48,
            frame.height,
            color,
            &frame.palette,
        )?);
        if frame.show_legend {
            body.push_str(&html::legend(&[("TVL (USD)".to_string(), color)])?);
        }

        let subtitle = shape.category().map(|c| format!("Category: {c}"));
        Ok(Artifact::Markup(html::document(
            &frame,
            subtitle.as_deref(),
            &body,
            None,
        )?))
    }
}
