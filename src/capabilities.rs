//! Capability surface exposed to the host.
//!
//! Every capability takes a JSON object that is validated into a typed
//! argument struct before use; unknown fields and type mismatches fail with
//! `InvalidArgument`.

use crate::content::ContentType;
use crate::error::{Error, Result};
use crate::render::ArtifactFormat;
use crate::template::TemplateOptions;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub use crate::distribution::CampaignRequest;

/// A named operation the host can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    GenerateVisualization,
    GetAvailableTemplates,
    FindSuitableTemplates,
    GeneratePriceChart,
    GenerateMarketOverview,
    GenerateTvlChart,
    SaveVisualization,
    DistributeToSocial,
    GenerateSocialContent,
    CreateSocialCampaign,
    GetSupportedSocialPlatforms,
}

impl Capability {
    pub const ALL: [Capability; 11] = [
        Self::GenerateVisualization,
        Self::GetAvailableTemplates,
        Self::FindSuitableTemplates,
        Self::GeneratePriceChart,
        Self::GenerateMarketOverview,
        Self::GenerateTvlChart,
        Self::SaveVisualization,
        Self::DistributeToSocial,
        Self::GenerateSocialContent,
        Self::CreateSocialCampaign,
        Self::GetSupportedSocialPlatforms,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::GenerateVisualization => "generateVisualization",
            Self::GetAvailableTemplates => "getAvailableTemplates",
            Self::FindSuitableTemplates => "findSuitableTemplates",
            Self::GeneratePriceChart => "generatePriceChart",
            Self::GenerateMarketOverview => "generateMarketOverview",
            Self::GenerateTvlChart => "generateTvlChart",
            Self::SaveVisualization => "saveVisualization",
            Self::DistributeToSocial => "distributeToSocial",
            Self::GenerateSocialContent => "generateSocialContent",
            Self::CreateSocialCampaign => "createSocialCampaign",
            Self::GetSupportedSocialPlatforms => "getSupportedSocialPlatforms",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::GenerateVisualization => "Render a payload with an explicit or best-matching template",
            Self::GetAvailableTemplates => "List registered templates",
            Self::FindSuitableTemplates => "List templates that accept a payload",
            Self::GeneratePriceChart => "Fetch a token and render its price chart",
            Self::GenerateMarketOverview => "Fetch top protocols and chains and render an overview",
            Self::GenerateTvlChart => "Fetch protocol or chain TVL and render a chart",
            Self::SaveVisualization => "Save markup or vector content as an artifact",
            Self::DistributeToSocial => "Publish an artifact to social platforms",
            Self::GenerateSocialContent => "Format post text for one platform",
            Self::CreateSocialCampaign => "Build a campaign of visualizations, posts and a schedule",
            Self::GetSupportedSocialPlatforms => "List supported platforms and their limits",
        }
    }

    /// Validate `args` into the capability's argument struct. `null` counts
    /// as an empty object.
    pub fn parse_args<T: DeserializeOwned>(self, args: Value) -> Result<T> {
        let args = if args.is_null() {
            Value::Object(Default::default())
        } else {
            args
        };
        serde_json::from_value(args)
            .map_err(|e| Error::invalid_argument(format!("{}: {e}", self.name())))
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Capability {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::invalid_argument(format!("unknown capability '{s}'")))
    }
}

/// Result of a capability call.
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityOutput {
    /// Raw artifact text (markup or vector).
    Text(String),
    /// Serialized result.
    Json(Value),
}

impl CapabilityOutput {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Json(_) => None,
        }
    }
}

impl fmt::Display for CapabilityOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Json(value) => match serde_json::to_string_pretty(value) {
                Ok(pretty) => f.write_str(&pretty),
                Err(_) => write!(f, "{value}"),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoArgs {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GenerateVisualizationArgs {
    pub data: Value,
    pub template_id: Option<String>,
    /// Template id substring preferred among suitable templates.
    #[serde(rename = "type")]
    pub type_hint: Option<String>,
    #[serde(default)]
    pub options: TemplateOptions,
    pub output_format: Option<ArtifactFormat>,
    /// Logical name for saved raster output.
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FindSuitableTemplatesArgs {
    pub data: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PriceChartArgs {
    /// Token contract address or symbol.
    #[serde(alias = "tokenAddress")]
    pub address: String,
    pub chain: Option<String>,
    pub days: Option<u32>,
    #[serde(default)]
    pub options: TemplateOptions,
    pub output_format: Option<ArtifactFormat>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MarketOverviewArgs {
    pub limit: Option<usize>,
    #[serde(default)]
    pub options: TemplateOptions,
    pub output_format: Option<ArtifactFormat>,
    pub name: Option<String>,
}

/// TVL breakdown rendered as a distribution instead of a time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakdown {
    Chains,
    Categories,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TvlChartArgs {
    pub protocol: Option<String>,
    pub chain: Option<String>,
    pub breakdown: Option<Breakdown>,
    pub days: Option<u32>,
    #[serde(default)]
    pub options: TemplateOptions,
    pub output_format: Option<ArtifactFormat>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SaveVisualizationArgs {
    pub content: String,
    pub name: String,
    /// Inferred from the content when absent.
    pub format: Option<ArtifactFormat>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DistributeArgs {
    pub artifact_path: PathBuf,
    pub platforms: Vec<String>,
    pub message: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SocialContentArgs {
    pub data: Value,
    pub platform: String,
    pub content_type: Option<ContentType>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_capability_names_roundtrip() {
        for capability in Capability::ALL {
            assert_eq!(capability.name().parse::<Capability>().unwrap(), capability);
        }
        assert_eq!(
            "GENERATEPRICECHART".parse::<Capability>().unwrap(),
            Capability::GeneratePriceChart
        );
        assert!("launchRocket".parse::<Capability>().is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_fields() {
        let err = Capability::GenerateVisualization
            .parse_args::<GenerateVisualizationArgs>(json!({"data": {}, "colour": "red"}))
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidArgument");
        assert!(err.to_string().contains("generateVisualization"));
    }

    #[test]
    fn test_parse_keeps_extended_options() {
        let args: GenerateVisualizationArgs = Capability::GenerateVisualization
            .parse_args(json!({
                "data": {"historicalTvl": []},
                "type": "tvl",
                "options": {"width": 640, "limit": 5},
                "outputFormat": "svg"
            }))
            .unwrap();
        assert_eq!(args.type_hint.as_deref(), Some("tvl"));
        assert_eq!(args.options.width, Some(640));
        assert_eq!(args.options.extra("limit"), Some(&json!(5)));
        assert_eq!(args.output_format, Some(ArtifactFormat::Svg));
    }

    #[test]
    fn test_null_args_are_empty() {
        assert!(
            Capability::GetAvailableTemplates
                .parse_args::<NoArgs>(Value::Null)
                .is_ok()
        );
        assert!(
            Capability::DistributeToSocial
                .parse_args::<DistributeArgs>(Value::Null)
                .is_err()
        );
    }

    #[test]
    fn test_price_chart_alias() {
        let args: PriceChartArgs = Capability::GeneratePriceChart
            .parse_args(json!({"tokenAddress": "0xabc", "days": 7}))
            .unwrap();
        assert_eq!(args.address, "0xabc");
        assert_eq!(args.days, Some(7));
    }
}
