//! Rendering and format conversion.
//!
//! The [`Renderer`] runs template generators and converts artifacts between
//! markup, vector and raster forms. Rasterization goes through a scoped
//! browser sandbox that is released on every exit path.

mod artifact;
#[cfg(feature = "chromium")]
mod chromium;
mod sandbox;
mod store;
mod vector;

pub use artifact::{Artifact, ArtifactFormat};
#[cfg(feature = "chromium")]
pub use chromium::ChromiumLauncher;
pub use sandbox::{
    Bounds, RenderSandbox, SandboxGuard, SandboxLauncher, Surface, UnavailableLauncher,
};
pub use store::{ArtifactStore, slug};
pub use vector::{extract_svg, wrap_svg};

#[cfg(test)]
pub use sandbox::{MockRenderSandbox, MockSandboxLauncher};

use crate::config::RenderConfig;
use crate::error::{Error, Result};
use crate::template::{Template, TemplateOptions};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Longest wait for a sandbox to close once a conversion has finished.
const RELEASE_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs templates and converts artifacts.
#[derive(Clone)]
pub struct Renderer {
    launcher: Arc<dyn SandboxLauncher>,
    config: RenderConfig,
}

impl Renderer {
    pub fn new(launcher: Arc<dyn SandboxLauncher>, config: RenderConfig) -> Self {
        Self { launcher, config }
    }

    /// Renderer backed by the compiled-in browser, if any.
    pub fn from_config(config: RenderConfig) -> Self {
        #[cfg(feature = "chromium")]
        let launcher: Arc<dyn SandboxLauncher> = Arc::new(ChromiumLauncher::new(config.clone()));
        #[cfg(not(feature = "chromium"))]
        let launcher: Arc<dyn SandboxLauncher> = Arc::new(UnavailableLauncher);
        Self::new(launcher, config)
    }

    /// Run `template` against `data`.
    pub fn render(
        &self,
        template: &dyn Template,
        data: &Value,
        options: &TemplateOptions,
    ) -> Result<Artifact> {
        debug!("Rendering template: {}", template.id());
        template.generate(data, options)
    }

    /// Convert `artifact` to `target`. Same-format conversion returns the
    /// artifact untouched.
    pub async fn convert_format(&self, artifact: Artifact, target: ArtifactFormat) -> Result<Artifact> {
        let from = artifact.format();
        match (artifact, target) {
            (artifact, target) if from == target => Ok(artifact),
            (Artifact::Markup(markup), ArtifactFormat::Svg) => extract_svg(&markup)
                .map(|svg| Artifact::Vector(svg.to_string()))
                .ok_or(Error::NoVectorContent),
            (Artifact::Markup(markup), ArtifactFormat::Png) => {
                self.rasterize(&markup).await.map(Artifact::Raster)
            }
            (Artifact::Vector(svg), ArtifactFormat::Png) => {
                self.rasterize(&wrap_svg(&svg)).await.map(Artifact::Raster)
            }
            (_, to) => Err(Error::UnsupportedConversion { from, to }),
        }
    }

    /// Load `markup` in a fresh sandbox and capture the primary content
    /// element as PNG.
    ///
    /// The whole operation, sandbox startup included, is bounded by the
    /// configured timeout. The sandbox is released before any error
    /// propagates; release itself is bounded separately.
    async fn rasterize(&self, markup: &str) -> Result<Vec<u8>> {
        let timeout = self.config.timeout();
        let deadline = tokio::time::Instant::now() + timeout;

        let mut guard = tokio::time::timeout_at(deadline, SandboxGuard::acquire(self.launcher.as_ref()))
            .await
            .map_err(|_| Error::timeout(format!("sandbox startup exceeded {}s", timeout.as_secs())))??;

        let outcome = match guard.sandbox() {
            Ok(sandbox) => {
                tokio::time::timeout_at(deadline, capture_primary(sandbox, markup, &self.config))
                    .await
                    .unwrap_or_else(|_| {
                        Err(Error::timeout(format!(
                            "rasterization exceeded {}s",
                            timeout.as_secs()
                        )))
                    })
            }
            Err(e) => Err(e),
        };

        guard.release(RELEASE_TIMEOUT).await;

        if let Ok(png) = &outcome {
            info!("Rasterized artifact ({} bytes)", png.len());
        }
        outcome
    }
}

async fn capture_primary(
    sandbox: &mut dyn RenderSandbox,
    markup: &str,
    config: &RenderConfig,
) -> Result<Vec<u8>> {
    sandbox.load(markup).await?;

    let bounds = match sandbox.element_bounds(&config.content_selector).await? {
        Some(bounds) if !bounds.is_empty() => bounds,
        _ => {
            debug!(
                "Primary element '{}' missing or empty, using document bounds",
                config.content_selector
            );
            sandbox.document_bounds().await?
        }
    };

    if bounds.is_empty() {
        return Err(Error::sandbox("document has no visible content"));
    }

    sandbox
        .capture(Surface::fit(bounds, config.device_scale_factor))
        .await
}
