//! Error types for Chartcast.

use crate::render::ArtifactFormat;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Chartcast.
#[derive(Error, Debug)]
pub enum Error {
    /// IO errors (artifact files, config files, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Upstream market data fetch failed
    #[error("Provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    /// No registered template accepts the payload
    #[error("No suitable template: {0}")]
    NoSuitableTemplate(String),

    /// An explicit template id is not registered
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    /// An explicit template id rejects the payload
    #[error("Unsuitable template: '{0}' cannot render the provided data")]
    UnsuitableTemplate(String),

    /// The requested artifact conversion is not possible
    #[error("Unsupported conversion: {from} -> {to}")]
    UnsupportedConversion {
        from: ArtifactFormat,
        to: ArtifactFormat,
    },

    /// A markup template failed to render
    #[error("Markup error: {0}")]
    Markup(#[from] askama::Error),

    /// Markup has no embedded vector block
    #[error("No vector content: markup contains no <svg> element")]
    NoVectorContent,

    /// Publish attempted against a missing file
    #[error("Artifact not found: {}", .0.display())]
    ArtifactNotFound(PathBuf),

    /// A single platform call failed
    #[error("Platform publish error ({platform}): {message}")]
    PlatformPublish { platform: String, message: String },

    /// Rendering sandbox failures (startup, navigation, capture)
    #[error("Sandbox error: {0}")]
    Sandbox(String),

    /// A bounded operation ran out of time
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Invalid argument or schema mismatch
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Alias for Result with our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new provider error.
    pub fn provider(provider: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: msg.into(),
        }
    }

    /// Create a new platform publish error.
    pub fn platform(platform: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::PlatformPublish {
            platform: platform.into(),
            message: msg.into(),
        }
    }

    /// Create a new sandbox error.
    pub fn sandbox(msg: impl Into<String>) -> Self {
        Self::Sandbox(msg.into())
    }

    /// Create a new timeout error.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Name of the error kind, as surfaced to hosts.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io(_) => "IoError",
            Self::Serialization(_) => "SerializationError",
            Self::Config(_) => "ConfigError",
            Self::Provider { .. } => "ProviderError",
            Self::NoSuitableTemplate(_) => "NoSuitableTemplate",
            Self::TemplateNotFound(_) => "TemplateNotFound",
            Self::UnsuitableTemplate(_) => "UnsuitableTemplate",
            Self::UnsupportedConversion { .. } => "UnsupportedConversion",
            Self::Markup(_) => "MarkupError",
            Self::NoVectorContent => "NoVectorContent",
            Self::ArtifactNotFound(_) => "ArtifactNotFound",
            Self::PlatformPublish { .. } => "PlatformPublishError",
            Self::Sandbox(_) => "SandboxError",
            Self::Timeout(_) => "Timeout",
            Self::InvalidArgument(_) => "InvalidArgument",
        }
    }

    /// Check if this error is recoverable (caller may retry).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::Provider { .. } | Self::Sandbox(_) | Self::PlatformPublish { .. }
        )
    }
}
