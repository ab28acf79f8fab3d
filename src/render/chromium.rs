//! Headless Chromium sandbox backend.

use super::sandbox::{Bounds, RenderSandbox, SandboxLauncher, Surface};
use crate::config::RenderConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, EventLifecycleEvent, SetLifecycleEventsEnabledParams, Viewport,
};
use chromiumoxide::listeners::EventStream;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Longest wait for the document's network to go quiet. Pages that poll
/// forever are captured once it elapses.
const NETWORK_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Waits for the next animation frame plus `settle` ms, after web fonts load.
const SETTLE_SCRIPT: &str = r#"new Promise(resolve => {
    const done = () => requestAnimationFrame(() => setTimeout(resolve, SETTLE_MS));
    (document.fonts ? document.fonts.ready : Promise.resolve()).then(done);
})"#;

const DOCUMENT_BOUNDS_SCRIPT: &str = r#"(() => {
    const el = document.documentElement;
    return { x: 0, y: 0, width: el.scrollWidth, height: el.scrollHeight };
})()"#;

/// Launches one headless Chromium process per sandbox.
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    config: RenderConfig,
}

impl ChromiumLauncher {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SandboxLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn RenderSandbox>> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(self.config.timeout());
        if let Some(path) = &self.config.browser_path {
            builder = builder.chrome_executable(path);
        }
        let browser_config = builder.build().map_err(Error::sandbox)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| Error::sandbox(format!("browser startup failed: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let mut sandbox = ChromiumSandbox {
                    browser,
                    page: None,
                    handler_task,
                    settle: Duration::from_millis(self.config.settle_ms),
                };
                if let Err(close_err) = sandbox.close().await {
                    warn!("Failed to close browser after page error: {}", close_err);
                }
                return Err(Error::sandbox(format!("failed to open page: {e}")));
            }
        };

        debug!("Chromium sandbox launched");
        Ok(Box::new(ChromiumSandbox {
            browser,
            page: Some(page),
            handler_task,
            settle: Duration::from_millis(self.config.settle_ms),
        }))
    }
}

/// Resolve once the navigated document reports `networkIdle`.
///
/// Events before the document's `init` belong to the previous document and
/// are skipped.
async fn network_idle(events: &mut EventStream<EventLifecycleEvent>) {
    let mut started = false;
    while let Some(event) = events.next().await {
        match event.name.as_str() {
            "init" => started = true,
            "networkIdle" if started => return,
            _ => {}
        }
    }
}

/// One browser process with one page.
struct ChromiumSandbox {
    browser: Browser,
    page: Option<Page>,
    handler_task: JoinHandle<()>,
    settle: Duration,
}

impl ChromiumSandbox {
    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| Error::sandbox("page is closed"))
    }
}

#[async_trait]
impl RenderSandbox for ChromiumSandbox {
    async fn load(&mut self, markup: &str) -> Result<()> {
        let page = self.page()?;
        page.execute(SetLifecycleEventsEnabledParams::new(true))
            .await
            .map_err(|e| Error::sandbox(format!("lifecycle setup failed: {e}")))?;
        let mut lifecycle = page
            .event_listener::<EventLifecycleEvent>()
            .await
            .map_err(|e| Error::sandbox(format!("lifecycle setup failed: {e}")))?;

        // A real navigation, so the document gets its own lifecycle events.
        let url = format!("data:text/html;charset=utf-8;base64,{}", BASE64.encode(markup));
        page.goto(url)
            .await
            .map_err(|e| Error::sandbox(format!("navigation failed: {e}")))?;

        if tokio::time::timeout(NETWORK_IDLE_TIMEOUT, network_idle(&mut lifecycle))
            .await
            .is_err()
        {
            warn!(
                "Network not idle after {}s, capturing anyway",
                NETWORK_IDLE_TIMEOUT.as_secs()
            );
        }

        let script = SETTLE_SCRIPT.replace("SETTLE_MS", &self.settle.as_millis().to_string());
        page.evaluate(script)
            .await
            .map_err(|e| Error::sandbox(format!("settle script failed: {e}")))?;
        Ok(())
    }

    async fn element_bounds(&mut self, selector: &str) -> Result<Option<Bounds>> {
        let page = self.page()?;
        let Ok(element) = page.find_element(selector).await else {
            return Ok(None);
        };
        let bbox = element
            .bounding_box()
            .await
            .map_err(|e| Error::sandbox(format!("measure failed: {e}")))?;
        Ok(Some(Bounds {
            x: bbox.x,
            y: bbox.y,
            width: bbox.width,
            height: bbox.height,
        }))
    }

    async fn document_bounds(&mut self) -> Result<Bounds> {
        let page = self.page()?;
        page.evaluate(DOCUMENT_BOUNDS_SCRIPT)
            .await
            .map_err(|e| Error::sandbox(format!("measure failed: {e}")))?
            .into_value::<Bounds>()
            .map_err(|e| Error::sandbox(format!("measure failed: {e}")))
    }

    async fn capture(&mut self, surface: Surface) -> Result<Vec<u8>> {
        let page = self.page()?;
        page.execute(SetDeviceMetricsOverrideParams::new(
            i64::from(surface.width),
            i64::from(surface.height),
            surface.scale,
            false,
        ))
        .await
        .map_err(|e| Error::sandbox(format!("viewport setup failed: {e}")))?;

        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(false)
            .clip(Viewport {
                x: surface.clip.x,
                y: surface.clip.y,
                width: surface.clip.width,
                height: surface.clip.height,
                scale: 1.0,
            })
            .build();

        page.screenshot(params)
            .await
            .map_err(|e| Error::sandbox(format!("capture failed: {e}")))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                warn!("Failed to close page: {}", e);
            }
        }
        let closed = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            warn!("Failed waiting for browser exit: {}", e);
        }
        self.handler_task.abort();
        closed
            .map(|_| ())
            .map_err(|e| Error::sandbox(format!("browser shutdown failed: {e}")))
    }
}
