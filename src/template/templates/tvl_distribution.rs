//! TVL distribution bars by chain and by category.
//!
//! | option        | default                  |
//! |---------------|--------------------------|
//! | `width`       | 900                      |
//! | `height`      | 500                      |
//! | `colorScheme` | `dark`                   |
//! | `title`       | `"TVL Distribution"`     |
//! | `showLegend`  | `false`                  |
//! | `fontFamily`  | system sans-serif stack  |
//! | `days`        | unused                   |
//!
//! Extended option `limit` (number) caps bars per section, default 12.

use super::{Defaults, frame};
use crate::error::{Error, Result};
use crate::format;
use crate::render::Artifact;
use crate::template::html::{self, stat, stats};
use crate::template::{DataShape, Template, TemplateOptions};
use serde_json::Value;
use std::collections::BTreeSet;

const DEFAULTS: Defaults = Defaults {
    width: 900,
    height: 500,
    show_legend: false,
    days: 0,
};

const DEFAULT_LIMIT: usize = 12;

/// Chain and category TVL distribution template.
#[derive(Debug, Default)]
pub struct TvlDistributionTemplate;

impl TvlDistributionTemplate {
    pub fn new() -> Self {
        Self
    }
}

impl Template for TvlDistributionTemplate {
    fn id(&self) -> &str {
        "tvl-distribution"
    }

    fn name(&self) -> &str {
        "TVL Distribution"
    }

    fn description(&self) -> &str {
        "Share of total value locked by chain and by category"
    }

    fn suitable_for(&self) -> BTreeSet<String> {
        ["chains", "categories", "tvl"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn is_suitable_for(&self, data: &Value) -> bool {
        DataShape::new(data).has_tvl_distribution()
    }

    fn generate(&self, data: &Value, options: &TemplateOptions) -> Result<Artifact> {
        if !self.is_suitable_for(data) {
            return Err(Error::UnsuitableTemplate(self.id().to_string()));
        }

        let shape = DataShape::new(data);
        let frame = frame(options, DEFAULTS, "TVL Distribution".to_string());
        let limit = options
            .extra("limit")
            .and_then(Value::as_u64)
            .map_or(DEFAULT_LIMIT, |l| l as usize);

        let mut body = String::new();
        for (key, heading) in [("chains", "By Chain"), ("categories", "By Category")] {
            let mut rows = shape.distribution(key);
            if rows.is_empty() {
                continue;
            }
            rows.sort_by(|a, b| b.1.total_cmp(&a.1));
            let total: f64 = rows.iter().map(|(_, tvl)| tvl).sum();
            rows.truncate(limit);

            body.push_str(&stats(&[stat(
                &format!("Total ({})", heading.to_lowercase()),
                &format::usd_compact(total),
                None,
            )])?);
            body.push_str(&format!("<h2>{heading}</h2>"));
            body.push_str(&html::bar_chart(
                &rows,
                frame.width - 48,
                &frame.palette,
                |tvl| {
                    if total > 0.0 {
                        format!("{} ({:.1}%)", format::usd_compact(tvl), tvl / total * 100.0)
                    } else {
                        format::usd_compact(tvl)
                    }
                },
            )?);
        }

        Ok(Artifact::Markup(html::document(&frame, None, &body, None)?))
    }
}
