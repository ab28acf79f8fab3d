//! Host runtime contract: artifact uploads and platform integration calls.

use super::http;
use crate::error::{Error, Result};
use crate::render::ArtifactFormat;
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Result of an artifact upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    /// Public URL of the uploaded file.
    pub url: String,
}

/// Services supplied by the host that embeds this crate.
///
/// Credentials for social platforms live in the host; each integration call is
/// one stateless request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HostRuntime: Send + Sync {
    async fn upload_artifact(
        &self,
        workspace_id: &str,
        path: &Path,
        bytes: Vec<u8>,
    ) -> Result<UploadResult>;

    async fn call_platform_integration(
        &self,
        platform: &str,
        endpoint: &str,
        method: &str,
        payload: Value,
    ) -> Result<Value>;
}

/// [`HostRuntime`] over the host's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpHostRuntime {
    client: Client,
    base_url: String,
}

impl HttpHostRuntime {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http::client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

fn content_type(path: &Path) -> &'static str {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(|e| e.parse::<ArtifactFormat>().ok())
        .map_or("application/octet-stream", ArtifactFormat::mime_type)
}

#[async_trait]
impl HostRuntime for HttpHostRuntime {
    async fn upload_artifact(
        &self,
        workspace_id: &str,
        path: &Path,
        bytes: Vec<u8>,
    ) -> Result<UploadResult> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::invalid_argument(format!("no file name in {}", path.display())))?;
        let url = format!("{}/workspaces/{workspace_id}/files", self.base_url);
        debug!("Uploading {} ({} bytes) to {}", file_name, bytes.len(), url);

        let response = self
            .client
            .post(&url)
            .query(&[("name", file_name)])
            .header(reqwest::header::CONTENT_TYPE, content_type(path))
            .body(bytes)
            .send()
            .await
            .map_err(|e| http::request_error("host", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::provider("host", format!("upload failed with HTTP {status}: {body}")));
        }
        response
            .json::<UploadResult>()
            .await
            .map_err(|e| Error::provider("host", format!("unexpected upload response: {e}")))
    }

    async fn call_platform_integration(
        &self,
        platform: &str,
        endpoint: &str,
        method: &str,
        payload: Value,
    ) -> Result<Value> {
        let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
            .map_err(|_| Error::invalid_argument(format!("invalid HTTP method '{method}'")))?;
        let url = format!("{}/integrations/{platform}/call", self.base_url);
        debug!("Calling {} integration: {} {}", platform, method, endpoint);

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "endpoint": endpoint,
                "method": method.as_str(),
                "payload": payload,
            }))
            .send()
            .await
            .map_err(|e| match http::request_error(platform, e) {
                Error::Timeout(msg) => Error::Timeout(msg),
                other => Error::platform(platform, other.to_string()),
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(Error::platform(platform, format!("HTTP {status}: {body}")));
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body)
            .map_err(|e| Error::platform(platform, format!("unexpected response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_from_extension() {
        assert_eq!(content_type(Path::new("/out/eth.png")), "image/png");
        assert_eq!(content_type(Path::new("/out/eth.html")), "text/html");
        assert_eq!(content_type(Path::new("/out/eth")), "application/octet-stream");
    }

    #[test]
    fn test_runtime_trims_base_url() {
        let host = HttpHostRuntime::new("http://localhost:3000/", Duration::from_secs(5)).unwrap();
        assert_eq!(host.base_url, "http://localhost:3000");
    }
}
