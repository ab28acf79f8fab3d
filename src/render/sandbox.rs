//! Rendering sandbox abstraction.
//!
//! A sandbox is an isolated, scriptable browser instance. It is acquired per
//! conversion through a [`SandboxLauncher`] and held in a [`SandboxGuard`],
//! which releases it on every exit path.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Bounding box of a document element, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn is_empty(&self) -> bool {
        !(self.width >= 1.0 && self.height >= 1.0)
    }
}

/// Output surface for a capture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    /// Region to capture, in CSS pixels.
    pub clip: Bounds,
    /// Viewport width in CSS pixels.
    pub width: u32,
    /// Viewport height in CSS pixels.
    pub height: u32,
    /// Device pixel ratio.
    pub scale: f64,
}

impl Surface {
    /// Size a surface to `bounds` at the given pixel density.
    pub fn fit(bounds: Bounds, scale: f64) -> Self {
        Self {
            clip: bounds,
            width: (bounds.x + bounds.width).ceil().max(1.0) as u32,
            height: (bounds.y + bounds.height).ceil().max(1.0) as u32,
            scale,
        }
    }
}

/// A live, isolated rendering sandbox.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RenderSandbox: Send {
    /// Load `markup` and wait until network activity and pending draw calls
    /// have settled.
    async fn load(&mut self, markup: &str) -> Result<()>;

    /// Bounding box of the first element matching `selector`, if any.
    async fn element_bounds(&mut self, selector: &str) -> Result<Option<Bounds>>;

    /// Bounds of the whole document.
    async fn document_bounds(&mut self) -> Result<Bounds>;

    /// Configure the surface and capture the visible clip region as PNG.
    async fn capture(&mut self, surface: Surface) -> Result<Vec<u8>>;

    /// Tear the sandbox down.
    async fn close(&mut self) -> Result<()>;
}

/// Starts sandboxes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SandboxLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn RenderSandbox>>;
}

/// Launcher used when no browser backend is compiled in.
#[derive(Debug, Default)]
pub struct UnavailableLauncher;

#[async_trait]
impl SandboxLauncher for UnavailableLauncher {
    async fn launch(&self) -> Result<Box<dyn RenderSandbox>> {
        Err(Error::sandbox(
            "no browser backend available (build with the `chromium` feature)",
        ))
    }
}

/// Scoped ownership of a sandbox.
///
/// Call [`SandboxGuard::release`] on the way out. If the guard is dropped
/// without release (e.g. the owning future was cancelled) the sandbox is
/// dropped with it, and backends must tear their process down in `Drop`.
pub struct SandboxGuard {
    sandbox: Option<Box<dyn RenderSandbox>>,
}

impl SandboxGuard {
    pub async fn acquire(launcher: &dyn SandboxLauncher) -> Result<Self> {
        let sandbox = launcher.launch().await?;
        debug!("Sandbox acquired");
        Ok(Self {
            sandbox: Some(sandbox),
        })
    }

    pub fn sandbox(&mut self) -> Result<&mut (dyn RenderSandbox + 'static)> {
        self.sandbox
            .as_deref_mut()
            .ok_or_else(|| Error::sandbox("sandbox already released"))
    }

    /// Close the sandbox, waiting at most `limit`. Close failures are
    /// logged, not returned, so they never mask the conversion's own outcome.
    /// A close that overruns `limit` is abandoned and the sandbox dropped.
    pub async fn release(mut self, limit: Duration) {
        if let Some(mut sandbox) = self.sandbox.take() {
            match tokio::time::timeout(limit, sandbox.close()).await {
                Ok(Ok(())) => debug!("Sandbox released"),
                Ok(Err(e)) => warn!("Failed to close sandbox cleanly: {}", e),
                Err(_) => warn!(
                    "Sandbox close exceeded {}s, dropping it",
                    limit.as_secs()
                ),
            }
        }
    }
}

impl Drop for SandboxGuard {
    fn drop(&mut self) {
        if self.sandbox.is_some() {
            warn!("Sandbox dropped without release; relying on backend teardown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_fits_bounds() {
        let surface = Surface::fit(
            Bounds {
                x: 8.0,
                y: 8.0,
                width: 800.4,
                height: 399.2,
            },
            2.0,
        );
        assert_eq!(surface.width, 809);
        assert_eq!(surface.height, 408);
        assert_eq!(surface.scale, 2.0);
    }

    #[test]
    fn test_empty_bounds() {
        let empty = Bounds {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 10.0,
        };
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_launcher() {
        let err = UnavailableLauncher.launch().await.err().unwrap();
        assert!(matches!(err, Error::Sandbox(_)));
    }

    #[tokio::test]
    async fn test_release_closes_once() {
        let mut sandbox = MockRenderSandbox::new();
        sandbox.expect_close().times(1).returning(|| Ok(()));

        let mut launcher = MockSandboxLauncher::new();
        launcher
            .expect_launch()
            .return_once(move || Ok(Box::new(sandbox) as Box<dyn RenderSandbox>));

        let guard = SandboxGuard::acquire(&launcher).await.unwrap();
        guard.release(Duration::from_secs(1)).await;
    }
}
