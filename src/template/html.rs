//! Markup building blocks shared by the built-in templates.
//!
//! Fragments render through askama templates under `templates/` with HTML
//! escaping, so payload text never reaches the document unescaped. Charts are
//! drawn as inline SVG so every document is self-contained and has a vector
//! block that format conversion can extract.

use super::traits::Palette;
use crate::error::{Error, Result};
use askama::Template;

/// Resolved layout settings common to every template.
#[derive(Debug, Clone)]
pub struct Frame {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub palette: Palette,
    pub font_family: String,
    pub show_legend: bool,
}

const MAX_FONT_STACK_LEN: usize = 200;

/// Check a caller-supplied CSS `font-family` list.
///
/// Accepts family names separated by commas, optionally quoted. The value is
/// written into a `<style>` block where entity escaping does not apply, so
/// anything outside that grammar is rejected.
pub fn font_stack(raw: &str) -> Result<&str> {
    let stack = raw.trim();
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, ' ' | ',' | '-' | '_' | '\'' | '"');
    let balanced = stack.matches('\'').count() % 2 == 0 && stack.matches('"').count() % 2 == 0;

    if stack.is_empty() || stack.len() > MAX_FONT_STACK_LEN || !balanced || !stack.chars().all(allowed) {
        return Err(Error::invalid_argument(format!(
            "fontFamily must be a comma-separated list of font names, got {raw:?}"
        )));
    }
    Ok(stack)
}

#[derive(Template)]
#[template(path = "chart_document.html", escape = "html")]
struct DocumentMarkup<'a> {
    title: &'a str,
    subtitle: Option<&'a str>,
    body: &'a str,
    footer: Option<&'a str>,
    font: &'a str,
    palette: &'a Palette,
    width: u32,
    height: u32,
}

/// Wrap rendered fragments in a standalone document.
///
/// The primary content element is `#chart-container`. `body` must come from
/// the fragment builders in this module.
pub fn document(
    frame: &Frame,
    subtitle: Option<&str>,
    body: &str,
    footer: Option<&str>,
) -> Result<String> {
    let markup = DocumentMarkup {
        title: &frame.title,
        subtitle,
        body,
        footer,
        font: font_stack(&frame.font_family)?,
        palette: &frame.palette,
        width: frame.width,
        height: frame.height,
    };
    Ok(markup.render()?)
}

/// A labelled statistic card.
#[derive(Debug, Clone)]
pub struct Stat {
    label: String,
    value: String,
    class: &'static str,
}

pub fn stat(label: &str, value: &str, class: Option<&'static str>) -> Stat {
    Stat {
        label: label.to_string(),
        value: value.to_string(),
        class: class.unwrap_or(""),
    }
}

#[derive(Template)]
#[template(path = "stat_cards.html", escape = "html")]
struct StatsMarkup<'a> {
    cards: &'a [Stat],
}

/// Row of statistic cards.
pub fn stats(cards: &[Stat]) -> Result<String> {
    Ok(StatsMarkup { cards }.render()?)
}

/// CSS class for the sign of a change.
pub fn change_class(value: f64) -> &'static str {
    if value >= 0.0 { "positive" } else { "negative" }
}

struct LegendEntry<'a> {
    label: &'a str,
    color: &'a str,
}

#[derive(Template)]
#[template(path = "legend.html", escape = "html")]
struct LegendMarkup<'a> {
    entries: Vec<LegendEntry<'a>>,
}

/// Legend row for labelled series.
pub fn legend(entries: &[(String, &str)]) -> Result<String> {
    let entries = entries
        .iter()
        .map(|(label, color)| LegendEntry { label, color })
        .collect();
    Ok(LegendMarkup { entries }.render()?)
}

struct Plot {
    area: String,
    line: String,
    axis: Option<Axis>,
}

struct Axis {
    y: String,
    first: String,
    last: String,
}

#[derive(Template)]
#[template(path = "line_chart.svg", escape = "html")]
struct LineChartMarkup<'a> {
    width: u32,
    height: u32,
    pad: f64,
    grid_end: String,
    grid_lines: Vec<String>,
    center_x: String,
    center_y: String,
    color: &'a str,
    palette: &'a Palette,
    plot: Option<Plot>,
}

/// Line/area chart over `values`, labelled with the first and last label.
pub fn line_chart(
    labels: &[String],
    values: &[f64],
    width: u32,
    height: u32,
    color: &str,
    palette: &Palette,
) -> Result<String> {
    let (w, h) = (f64::from(width), f64::from(height));
    let pad = 32.0;
    let grid_lines = (0..=4)
        .map(|i| format!("{:.1}", pad + (h - 2.0 * pad) * f64::from(i) / 4.0))
        .collect();

    let plot = (!values.is_empty()).then(|| {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let span = if (max - min).abs() < f64::EPSILON { 1.0 } else { max - min };
        let step = if values.len() > 1 {
            (w - 2.0 * pad) / (values.len() - 1) as f64
        } else {
            0.0
        };

        let line = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let x = pad + step * i as f64;
                let y = h - pad - (v - min) / span * (h - 2.0 * pad);
                format!("{x:.1},{y:.1}")
            })
            .collect::<Vec<_>>()
            .join(" ");
        let base = h - pad;
        let end = pad + step * (values.len() - 1) as f64;

        Plot {
            area: format!("{pad},{base:.1} {line} {end:.1},{base:.1}"),
            line,
            axis: labels.first().zip(labels.last()).map(|(first, last)| Axis {
                y: format!("{:.1}", h - 8.0),
                first: first.clone(),
                last: last.clone(),
            }),
        }
    });

    let markup = LineChartMarkup {
        width,
        height,
        pad,
        grid_end: format!("{:.1}", w - pad),
        grid_lines,
        center_x: format!("{:.1}", w / 2.0),
        center_y: format!("{:.1}", h / 2.0),
        color,
        palette,
        plot,
    };
    Ok(markup.render()?)
}

struct Bar {
    label: String,
    value: String,
    color: &'static str,
    y: String,
    text_y: String,
    width: String,
    value_x: String,
}

#[derive(Template)]
#[template(path = "bar_chart.svg", escape = "html")]
struct BarChartMarkup<'a> {
    width: u32,
    height: f64,
    label_width: f64,
    bar_height: f64,
    bars: Vec<Bar>,
    palette: &'a Palette,
}

/// Horizontal bar chart of `(label, value)` rows with formatted values.
pub fn bar_chart(
    rows: &[(String, f64)],
    width: u32,
    palette: &Palette,
    format_value: impl Fn(f64) -> String,
) -> Result<String> {
    let row_height = 28.0;
    let label_width = 140.0;
    let value_width = 90.0;
    let max = rows.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
    let bar_space = (f64::from(width) - label_width - value_width).max(10.0);

    let bars = rows
        .iter()
        .enumerate()
        .map(|(i, (label, value))| {
            let y = i as f64 * row_height + 4.0;
            let bar = if max > 0.0 { value / max * bar_space } else { 0.0 };
            Bar {
                label: label.clone(),
                value: format_value(*value),
                color: palette.series[i % palette.series.len()],
                y: format!("{y:.1}"),
                text_y: format!("{:.1}", y + row_height * 0.6),
                width: format!("{bar:.1}"),
                value_x: format!("{:.1}", label_width + bar + 8.0),
            }
        })
        .collect();

    let markup = BarChartMarkup {
        width,
        height: (rows.len().max(1) as f64 * row_height + 8.0).ceil(),
        label_width,
        bar_height: row_height - 8.0,
        bars,
        palette,
    };
    Ok(markup.render()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::ColorScheme;

    fn frame(font_family: &str) -> Frame {
        Frame {
            title: "<b>\"A&B\"</b>".to_string(),
            width: 400,
            height: 300,
            palette: ColorScheme::Dark.palette(),
            font_family: font_family.to_string(),
            show_legend: false,
        }
    }

    #[test]
    fn test_document_escapes_text() {
        let markup = document(
            &frame("Inter, sans-serif"),
            Some("<i>sub</i>"),
            "",
            Some("Updated <now>"),
        )
        .unwrap();
        assert!(markup.starts_with("<!DOCTYPE html>"));
        assert!(markup.contains("<title>&lt;b&gt;"));
        assert!(markup.contains("A&amp;B"));
        assert!(!markup.contains("<b>"));
        assert!(markup.contains("&lt;i&gt;sub&lt;/i&gt;"));
        assert!(markup.contains("Updated &lt;now&gt;"));
        assert!(markup.contains("font-family: Inter, sans-serif;"));
    }

    #[test]
    fn test_font_stack_accepts_quoted_names() {
        assert_eq!(
            font_stack(" 'Segoe UI', \"Fira Sans\", sans-serif ").unwrap(),
            "'Segoe UI', \"Fira Sans\", sans-serif"
        );
    }

    #[test]
    fn test_font_stack_rejects_css_breakout() {
        for raw in [
            "x; }</style><script>alert(1)</script><style>",
            "Inter; background: url(x)",
            "'unterminated, serif",
            "",
        ] {
            let err = font_stack(raw).unwrap_err();
            assert_eq!(err.kind(), "InvalidArgument", "{raw}");
        }

        let err = document(&frame("x; }</style><script>"), None, "", None).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_stats_and_legend_escape_labels() {
        let cards = stats(&[stat("<Price>", "$1 & up", Some("positive"))]).unwrap();
        assert!(cards.contains("&lt;Price&gt;"));
        assert!(cards.contains("$1 &amp; up"));
        assert!(cards.contains(r#"class="value positive""#));

        let legend = legend(&[("<script>".to_string(), "#fff")]).unwrap();
        assert!(legend.contains("--swatch: #fff"));
        assert!(!legend.contains("<script>"));
    }

    #[test]
    fn test_line_chart_handles_flat_and_empty_series() {
        let palette = ColorScheme::Dark.palette();
        let flat = line_chart(
            &["a".into(), "b".into()],
            &[5.0, 5.0],
            400,
            200,
            "#fff",
            &palette,
        )
        .unwrap();
        assert!(flat.contains("<polyline"));
        assert!(!flat.contains("NaN"));

        let empty = line_chart(&[], &[], 400, 200, "#fff", &palette).unwrap();
        assert!(empty.contains("No data"));
        assert!(!empty.contains("<polyline"));
        assert!(empty.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_bar_chart_escapes_labels() {
        let palette = ColorScheme::Light.palette();
        let svg = bar_chart(&[("<Aave>".into(), 10.0)], 600, &palette, |v| format!("{v}")).unwrap();
        assert!(svg.contains("&lt;Aave&gt;"));
        assert!(svg.contains(r##"fill="#3949ab""##));
    }
}
