//! Configuration settings for Chartcast.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Artifact output configuration.
    pub output: OutputConfig,
    /// Rendering sandbox configuration.
    pub render: RenderConfig,
    /// Market data provider configuration.
    pub providers: ProviderConfig,
    /// Publishing and campaign configuration.
    pub distribution: DistributionConfig,
}

impl Config {
    /// Load configuration from the default location, returning defaults if absent.
    pub fn load_or_default() -> crate::Result<Self> {
        Self::load(None)
    }

    /// Load configuration from file, layered with `CHARTCAST__*` environment overrides.
    pub fn load(path: Option<PathBuf>) -> crate::Result<Self> {
        let config_path = path.unwrap_or_else(Self::default_path);

        let config: Self = config::Config::builder()
            .add_source(config::File::from(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(super::ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| crate::Error::config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file.
    pub fn save(&self, path: Option<PathBuf>) -> crate::Result<()> {
        let config_path = path.unwrap_or_else(Self::default_path);

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::config(e.to_string()))?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Reject settings that would make rendering or scheduling misbehave.
    pub fn validate(&self) -> crate::Result<()> {
        if self.render.timeout_secs == 0 {
            return Err(crate::Error::config("render.timeout_secs must be positive"));
        }
        if !(self.render.device_scale_factor > 0.0) {
            return Err(crate::Error::config(
                "render.device_scale_factor must be positive",
            ));
        }
        if self.providers.timeout_secs == 0 || self.distribution.publish_timeout_secs == 0 {
            return Err(crate::Error::config("timeouts must be positive"));
        }
        if self.distribution.post_spacing_mins == 0 {
            return Err(crate::Error::config(
                "distribution.post_spacing_mins must be positive",
            ));
        }
        let spacing_secs = self
            .distribution
            .post_spacing_mins
            .checked_mul(60)
            .ok_or_else(|| crate::Error::config("distribution.post_spacing_mins is out of range"))?;
        if self.distribution.max_jitter_secs >= spacing_secs {
            return Err(crate::Error::config(
                "distribution.max_jitter_secs must be below the post spacing",
            ));
        }
        Ok(())
    }

    fn default_path() -> PathBuf {
        super::config_dir()
            .map(|p| p.join("config.toml"))
            .unwrap_or_else(|_| PathBuf::from("config.toml"))
    }
}

/// Artifact output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory where artifacts are written.
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: super::data_dir()
                .map(|p| p.join("visualizations"))
                .unwrap_or_else(|_| PathBuf::from("visualizations")),
        }
    }
}

/// Rendering sandbox configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Upper bound for a whole conversion, sandbox startup included.
    pub timeout_secs: u64,
    /// Pixel density multiplier for raster output.
    pub device_scale_factor: f64,
    /// CSS selector of the primary content element.
    pub content_selector: String,
    /// Extra settle time after the document reports idle, in milliseconds.
    pub settle_ms: u64,
    /// Path to a Chromium executable (auto-detected if unset).
    pub browser_path: Option<PathBuf>,
}

impl RenderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            device_scale_factor: 2.0,
            content_selector: "#chart-container".to_string(),
            settle_ms: 500,
            browser_path: None,
        }
    }
}

/// Market data provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// DexScreener API base URL.
    pub dexscreener_url: String,
    /// DefiLlama API base URL.
    pub defillama_url: String,
    /// DefiLlama coins (price history) API base URL.
    pub coins_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Chain assumed when a token lookup names none.
    pub default_chain: String,
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            dexscreener_url: "https://api.dexscreener.com".to_string(),
            defillama_url: "https://api.llama.fi".to_string(),
            coins_url: "https://coins.llama.fi".to_string(),
            timeout_secs: 30,
            default_chain: "ethereum".to_string(),
        }
    }
}

/// Publishing and campaign configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionConfig {
    /// Host runtime base URL.
    pub host_url: String,
    /// Workspace that receives uploaded artifacts.
    pub workspace_id: String,
    /// Upper bound for a single platform publish, upload included.
    pub publish_timeout_secs: u64,
    /// Spacing between scheduled campaign posts, in minutes.
    pub post_spacing_mins: u64,
    /// Maximum random offset added to each scheduled post, in seconds.
    pub max_jitter_secs: u64,
}

impl DistributionConfig {
    pub fn publish_timeout(&self) -> Duration {
        Duration::from_secs(self.publish_timeout_secs)
    }
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            host_url: "http://localhost:3000".to_string(),
            workspace_id: "default".to_string(),
            publish_timeout_secs: 60,
            post_spacing_mins: 120,
            max_jitter_secs: 900,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_jitter_must_stay_below_spacing() {
        let mut config = Config::default();
        config.distribution.post_spacing_mins = 1;
        config.distribution.max_jitter_secs = 60;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_spacing_overflow_is_rejected() {
        let mut config = Config::default();
        config.distribution.post_spacing_mins = u64::MAX;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.render.timeout_secs = 10;
        config.save(Some(path.clone())).unwrap();

        // SAFETY: no other test reads or writes this variable.
        unsafe { std::env::set_var("CHARTCAST__RENDER__TIMEOUT_SECS", "45") };
        let loaded = Config::load(Some(path));
        unsafe { std::env::remove_var("CHARTCAST__RENDER__TIMEOUT_SECS") };

        let loaded = loaded.unwrap();
        assert_eq!(loaded.render.timeout_secs, 45);
        assert_eq!(loaded.render.timeout(), Duration::from_secs(45));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.render.device_scale_factor = 3.0;
        config.distribution.workspace_id = "ws-42".to_string();
        config.save(Some(path.clone())).unwrap();

        let loaded = Config::load(Some(path)).unwrap();
        assert_eq!(loaded.render.device_scale_factor, 3.0);
        assert_eq!(loaded.distribution.workspace_id, "ws-42");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load(Some(dir.path().join("absent.toml"))).unwrap();
        assert_eq!(loaded.render.content_selector, "#chart-container");
    }
}
