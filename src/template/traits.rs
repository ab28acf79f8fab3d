//! Core template traits and types.

use crate::error::Result;
use crate::render::Artifact;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Debug;

/// Core trait that all visualization templates must implement.
///
/// A template pairs a pure suitability predicate with a generator that turns
/// a payload into a standalone markup document.
pub trait Template: Send + Sync + Debug {
    /// Returns the unique, stable identifier of this template.
    fn id(&self) -> &str;

    /// Human-readable name.
    fn name(&self) -> &str;

    /// Short description of what the template draws.
    fn description(&self) -> &str {
        ""
    }

    /// Tags describing the data shapes this template handles.
    fn suitable_for(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    /// Returns metadata about this template.
    fn descriptor(&self) -> TemplateDescriptor {
        TemplateDescriptor {
            id: self.id().to_string(),
            name: self.name().to_string(),
            description: self.description().to_string(),
            suitable_for: self.suitable_for(),
        }
    }

    /// Whether this template can meaningfully render `data`.
    ///
    /// Must be a pure function of its input.
    fn is_suitable_for(&self, data: &Value) -> bool;

    /// Generate the artifact. Options absent from `options` take the
    /// template's documented defaults.
    fn generate(&self, data: &Value, options: &TemplateOptions) -> Result<Artifact>;
}

/// Metadata about a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDescriptor {
    /// Template id.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Shape tags.
    pub suitable_for: BTreeSet<String>,
}

/// Options passed to a template generator.
///
/// Unrecognized keys are preserved in `extra` so generators can read
/// extended options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_scheme: Option<ColorScheme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_legend: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
    /// Unrecognized keys, passed through untouched.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl TemplateOptions {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_color_scheme(mut self, scheme: ColorScheme) -> Self {
        self.color_scheme = Some(scheme);
        self
    }

    /// Read an extended option.
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

/// Chart color scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    Dark,
    Light,
}

/// Resolved palette for a color scheme.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub background: &'static str,
    pub surface: &'static str,
    pub foreground: &'static str,
    pub muted: &'static str,
    pub grid: &'static str,
    pub accent: &'static str,
    pub positive: &'static str,
    pub negative: &'static str,
    pub series: [&'static str; 6],
}

impl ColorScheme {
    pub fn palette(self) -> Palette {
        match self {
            Self::Dark => Palette {
                background: "#1e1e2e",
                surface: "#262637",
                foreground: "#cdd6f4",
                muted: "#7f849c",
                grid: "#45475a",
                accent: "#5c6bc0",
                positive: "#66bb6a",
                negative: "#ef5350",
                series: ["#5c6bc0", "#ff7043", "#66bb6a", "#ffa726", "#7986cb", "#26c6da"],
            },
            Self::Light => Palette {
                background: "#ffffff",
                surface: "#f5f5fa",
                foreground: "#1e1e2e",
                muted: "#6c6f85",
                grid: "#dce0e8",
                accent: "#3949ab",
                positive: "#2e7d32",
                negative: "#c62828",
                series: ["#3949ab", "#f4511e", "#2e7d32", "#fb8c00", "#5e35b1", "#00838f"],
            },
        }
    }
}
