//! Concurrent, per-platform publishing.

use crate::api::HostRuntime;
use crate::content::{MediaType, format_message, require_platform};
use crate::error::{Error, Result};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of publishing to one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Error kind name when the publish failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl PublishResult {
    fn succeeded(post_id: Option<String>, url: Option<String>) -> Self {
        Self {
            success: true,
            post_id,
            url,
            error: None,
            error_kind: None,
        }
    }

    fn failed(error: &Error) -> Self {
        Self {
            success: false,
            post_id: None,
            url: None,
            error: Some(error.to_string()),
            error_kind: Some(error.kind().to_string()),
        }
    }
}

/// Publishes one artifact to several platforms through the host.
#[derive(Clone)]
pub struct Publisher {
    host: Arc<dyn HostRuntime>,
    workspace_id: String,
    timeout: Duration,
}

impl Publisher {
    pub fn new(host: Arc<dyn HostRuntime>, workspace_id: impl Into<String>, timeout: Duration) -> Self {
        Self {
            host,
            workspace_id: workspace_id.into(),
            timeout,
        }
    }

    /// Publish `artifact_path` to every platform concurrently.
    ///
    /// Each platform succeeds or fails on its own; the returned map holds one
    /// result per requested platform and this never fails as a whole.
    pub async fn publish(
        &self,
        artifact_path: &Path,
        platforms: &[String],
        message: &str,
        tags: &[String],
    ) -> BTreeMap<String, PublishResult> {
        let branches = platforms.iter().map(|platform| async move {
            let result = self.publish_one(artifact_path, platform, message, tags).await;
            (platform.clone(), result)
        });

        let results: BTreeMap<String, PublishResult> = join_all(branches).await.into_iter().collect();
        let succeeded = results.values().filter(|r| r.success).count();
        info!(
            "Published {} to {}/{} platforms",
            artifact_path.display(),
            succeeded,
            results.len()
        );
        results
    }

    async fn publish_one(
        &self,
        artifact_path: &Path,
        platform: &str,
        message: &str,
        tags: &[String],
    ) -> PublishResult {
        let attempt = tokio::time::timeout(
            self.timeout,
            self.try_publish(artifact_path, platform, message, tags),
        )
        .await
        .unwrap_or_else(|_| {
            Err(Error::timeout(format!(
                "publishing to {platform} exceeded {}s",
                self.timeout.as_secs()
            )))
        });

        match attempt {
            Ok(result) => result,
            Err(e) => {
                warn!("Publishing to {} failed: {}", platform, e);
                PublishResult::failed(&e)
            }
        }
    }

    async fn try_publish(
        &self,
        artifact_path: &Path,
        platform: &str,
        message: &str,
        tags: &[String],
    ) -> Result<PublishResult> {
        let spec = require_platform(platform)?;
        let media = MediaType::of_path(artifact_path);
        spec.require_media(media)?;

        let bytes = match tokio::fs::read(artifact_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ArtifactNotFound(artifact_path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        let text = format_message(message, tags, spec);
        let upload = self
            .host
            .upload_artifact(&self.workspace_id, artifact_path, bytes)
            .await
            .map_err(|e| scoped(spec.id, e))?;

        let payload = json!({
            "text": text,
            "media": [{ "url": upload.url, "type": media }],
        });
        let response = self
            .host
            .call_platform_integration(spec.id, spec.endpoint, "POST", payload)
            .await
            .map_err(|e| scoped(spec.id, e))?;

        let (post_id, url) = post_reference(&response);
        info!("Published to {} (post {:?})", spec.id, post_id);
        Ok(PublishResult::succeeded(post_id, url))
    }
}

/// Attribute a host failure to `platform`, keeping timeouts distinct.
fn scoped(platform: &str, error: Error) -> Error {
    match error {
        Error::PlatformPublish { .. } | Error::Timeout(_) => error,
        other => Error::platform(platform, other.to_string()),
    }
}

/// Post id and permalink from an integration response, across the shapes
/// platforms return.
fn post_reference(response: &Value) -> (Option<String>, Option<String>) {
    let text = |value: &Value| match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    };
    let lookup = |pointers: &[&str]| {
        pointers
            .iter()
            .find_map(|pointer| response.pointer(pointer).and_then(text))
    };

    (
        lookup(&["/postId", "/id", "/data/id", "/result/message_id", "/message_id"]),
        lookup(&["/url", "/permalink", "/data/url"]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockHostRuntime, UploadResult};
    use pretty_assertions::assert_eq;

    fn artifact() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eth-price.png");
        std::fs::write(&path, b"\x89PNG").unwrap();
        (dir, path)
    }

    fn uploads(host: &mut MockHostRuntime) {
        host.expect_upload_artifact().returning(|_, _, _| {
            Ok(UploadResult {
                url: "https://cdn.example/eth-price.png".to_string(),
            })
        });
    }

    #[tokio::test]
    async fn test_failure_on_one_platform_does_not_block_another() {
        let (_dir, path) = artifact();
        let mut host = MockHostRuntime::new();
        uploads(&mut host);
        host.expect_call_platform_integration()
            .returning(|platform, _, _, _| match platform {
                "twitter" => Err(Error::platform("twitter", "rate limited")),
                _ => Ok(json!({"id": "msg-1", "url": "https://discord.example/msg-1"})),
            });

        let publisher = Publisher::new(Arc::new(host), "ws", Duration::from_secs(5));
        let results = publisher
            .publish(
                &path,
                &["twitter".to_string(), "discord".to_string()],
                "ETH update",
                &["crypto".to_string()],
            )
            .await;

        assert_eq!(results.len(), 2);
        assert!(!results["twitter"].success);
        assert_eq!(results["twitter"].error_kind.as_deref(), Some("PlatformPublishError"));
        assert!(results["twitter"].error.as_deref().unwrap().contains("rate limited"));
        assert_eq!(
            results["discord"],
            PublishResult::succeeded(
                Some("msg-1".to_string()),
                Some("https://discord.example/msg-1".to_string())
            )
        );
    }

    #[tokio::test]
    async fn test_missing_artifact_fails_each_branch_without_host_calls() {
        let dir = tempfile::tempdir().unwrap();
        let host = MockHostRuntime::new();
        let publisher = Publisher::new(Arc::new(host), "ws", Duration::from_secs(5));

        let results = publisher
            .publish(
                &dir.path().join("missing.png"),
                &["twitter".to_string(), "telegram".to_string()],
                "hello",
                &[],
            )
            .await;

        for result in results.values() {
            assert!(!result.success);
            assert_eq!(result.error_kind.as_deref(), Some("ArtifactNotFound"));
        }
    }

    #[tokio::test]
    async fn test_unknown_platform_is_scoped() {
        let (_dir, path) = artifact();
        let mut host = MockHostRuntime::new();
        uploads(&mut host);
        host.expect_call_platform_integration()
            .withf(|platform, endpoint, method, payload| {
                platform == "linkedin"
                    && endpoint == "/v2/ugcPosts"
                    && method == "POST"
                    && payload["text"] == "Weekly chart\n\n#crypto"
                    && payload["media"][0]["url"] == "https://cdn.example/eth-price.png"
            })
            .times(1)
            .returning(|_, _, _, _| Ok(json!({"postId": 42})));

        let publisher = Publisher::new(Arc::new(host), "ws", Duration::from_secs(5));
        let results = publisher
            .publish(
                &path,
                &["myspace".to_string(), "linkedin".to_string()],
                "Weekly chart",
                &["crypto".to_string()],
            )
            .await;

        assert_eq!(results["myspace"].error_kind.as_deref(), Some("InvalidArgument"));
        assert!(results["linkedin"].success);
        assert_eq!(results["linkedin"].post_id.as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn test_media_kind_is_checked_per_platform() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.html");
        std::fs::write(&path, "<!DOCTYPE html>").unwrap();

        let mut host = MockHostRuntime::new();
        uploads(&mut host);
        host.expect_call_platform_integration()
            .withf(|platform, _, _, payload| {
                platform == "discord" && payload["media"][0]["type"] == "document"
            })
            .times(1)
            .returning(|_, _, _, _| Ok(json!({"id": "msg-2"})));

        let publisher = Publisher::new(Arc::new(host), "ws", Duration::from_secs(5));
        let results = publisher
            .publish(
                &path,
                &["twitter".to_string(), "discord".to_string()],
                "Interactive chart",
                &[],
            )
            .await;

        let twitter = &results["twitter"];
        assert!(!twitter.success);
        assert_eq!(twitter.error_kind.as_deref(), Some("InvalidArgument"));
        assert!(twitter.error.as_deref().unwrap().contains("document"));
        assert!(results["discord"].success);
    }

    #[tokio::test]
    async fn test_raster_goes_out_as_image() {
        let (_dir, path) = artifact();
        let mut host = MockHostRuntime::new();
        uploads(&mut host);
        host.expect_call_platform_integration()
            .withf(|_, _, _, payload| payload["media"][0]["type"] == "image")
            .times(1)
            .returning(|_, _, _, _| Ok(json!({"id": "1"})));

        let publisher = Publisher::new(Arc::new(host), "ws", Duration::from_secs(5));
        let results = publisher.publish(&path, &["twitter".to_string()], "hi", &[]).await;
        assert!(results["twitter"].success);
    }

    #[tokio::test]
    async fn test_upload_failure_is_platform_scoped() {
        let (_dir, path) = artifact();
        let mut host = MockHostRuntime::new();
        host.expect_upload_artifact()
            .returning(|_, _, _| Err(Error::provider("host", "disk full")));

        let publisher = Publisher::new(Arc::new(host), "ws", Duration::from_secs(5));
        let results = publisher
            .publish(&path, &["discord".to_string()], "hi", &[])
            .await;

        let discord = &results["discord"];
        assert_eq!(discord.error_kind.as_deref(), Some("PlatformPublishError"));
        assert!(discord.error.as_deref().unwrap().contains("disk full"));
    }

    #[test]
    fn test_post_reference_shapes() {
        assert_eq!(
            post_reference(&json!({"data": {"id": "123"}})),
            (Some("123".to_string()), None)
        );
        assert_eq!(
            post_reference(&json!({"result": {"message_id": 7}})),
            (Some("7".to_string()), None)
        );
        assert_eq!(post_reference(&Value::Null), (None, None));
    }
}
