//! Rendered artifacts and their formats.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Format tag of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    /// Standalone HTML document.
    Html,
    /// PNG image.
    Png,
    /// SVG excerpt.
    Svg,
}

impl ArtifactFormat {
    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Html => "text/html",
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
        }
    }
}

impl std::fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ArtifactFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" | "markup" => Ok(Self::Html),
            "png" | "raster" | "image" => Ok(Self::Png),
            "svg" | "vector" => Ok(Self::Svg),
            other => Err(Error::invalid_argument(format!(
                "unknown artifact format '{other}' (expected html, png or svg)"
            ))),
        }
    }
}

/// A rendered visualization. The variant is the format tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// Standalone HTML document.
    Markup(String),
    /// SVG excerpt.
    Vector(String),
    /// PNG bytes.
    Raster(Vec<u8>),
}

impl Artifact {
    pub fn format(&self) -> ArtifactFormat {
        match self {
            Self::Markup(_) => ArtifactFormat::Html,
            Self::Vector(_) => ArtifactFormat::Svg,
            Self::Raster(_) => ArtifactFormat::Png,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Markup(text) | Self::Vector(text) => text.as_bytes(),
            Self::Raster(bytes) => bytes,
        }
    }

    /// Text content for markup and vector artifacts.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Markup(text) | Self::Vector(text) => Some(text),
            Self::Raster(_) => None,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Markup(text) | Self::Vector(text) => text.into_bytes(),
            Self::Raster(bytes) => bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!("PNG".parse::<ArtifactFormat>().unwrap(), ArtifactFormat::Png);
        assert_eq!("vector".parse::<ArtifactFormat>().unwrap(), ArtifactFormat::Svg);
        assert!("gif".parse::<ArtifactFormat>().is_err());
    }

    #[test]
    fn test_artifact_accessors() {
        let raster = Artifact::Raster(vec![0x89, b'P', b'N', b'G']);
        assert_eq!(raster.format(), ArtifactFormat::Png);
        assert!(raster.as_text().is_none());
        assert_eq!(raster.as_bytes().len(), 4);

        let markup = Artifact::Markup("<html></html>".into());
        assert_eq!(markup.format().extension(), "html");
        assert_eq!(markup.as_text(), Some("<html></html>"));
    }
}
