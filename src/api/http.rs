//! Shared HTTP plumbing for provider adapters.

use crate::error::{Error, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("chartcast/", env!("CARGO_PKG_VERSION"));

pub(crate) fn client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))
}

/// Map a transport error, keeping timeouts distinct.
pub(crate) fn request_error(source: &str, e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::timeout(format!("{source} request timed out"))
    } else {
        Error::provider(source, format!("request failed: {e}"))
    }
}

/// GET `url` and decode the JSON body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    provider: &str,
    url: &str,
    params: &[(&str, &str)],
) -> Result<T> {
    debug!("{} request: {} with {} params", provider, url, params.len());

    let response = client
        .get(url)
        .query(params)
        .send()
        .await
        .map_err(|e| request_error(provider, e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::provider(
            provider,
            format!("HTTP {status} from {url}: {}", body.chars().take(200).collect::<String>()),
        ));
    }

    let body = response
        .text()
        .await
        .map_err(|e| request_error(provider, e))?;
    serde_json::from_str(&body)
        .map_err(|e| Error::provider(provider, format!("unexpected response from {url}: {e}")))
}
