//! Feed transport: retrieves raw feed bytes for a channel.
//!
//! Failures are logged and reported as `None`; there is no retry. Callers
//! that poll are responsible for their own cadence.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use std::time::Duration;

use reqwest::header::{HeaderValue, USER_AGENT};
use tracing::{error, info};

use crate::error::{IngestError, Result};
use crate::router::{Channel, ChannelRouter};

const USER_AGENT_VALUE: &str = concat!("transit-feed-ingest/", env!("CARGO_PKG_VERSION"));

/// GETs `url` with a per-request `timeout`, failing on non-success statuses.
pub async fn fetch_bytes<C: HttpClient>(
    client: &C,
    url: &str,
    timeout: Duration,
) -> Result<Vec<u8>> {
    let url_parsed = url
        .parse()
        .map_err(|e| IngestError::Configuration(format!("invalid feed URL {url}: {e}")))?;
    let mut req = reqwest::Request::new(reqwest::Method::GET, url_parsed);
    *req.timeout_mut() = Some(timeout);
    req.headers_mut()
        .insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

    let resp = client.execute(req).await?;
    if !resp.status().is_success() {
        return Err(IngestError::HttpStatus {
            url: url.to_string(),
            status: resp.status().as_u16(),
        });
    }
    Ok(resp.bytes().await?.to_vec())
}

/// Fetches the current feed bytes for `channel`.
///
/// Only channels from the closed [`Channel`] set can reach this point, so an
/// unknown identifier never produces a request.
#[tracing::instrument(skip(client, router), fields(channel = %channel))]
pub async fn fetch_channel<C: HttpClient>(
    client: &C,
    router: &ChannelRouter,
    channel: Channel,
    timeout: Duration,
) -> Option<Vec<u8>> {
    let url = router.feed_url(channel);
    info!("Fetching feed data");

    match fetch_bytes(client, &url, timeout).await {
        Ok(bytes) => {
            info!(bytes = bytes.len(), "Fetched feed data");
            Some(bytes)
        }
        Err(e) => {
            error!(url = %url, error = %e, "Error fetching feed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_url_is_configuration_error() {
        let client = BasicClient::new();
        let err = fetch_bytes(&client, "not a url", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn test_unreachable_feed_yields_none() {
        let client = BasicClient::new();
        // port 9 (discard) on loopback refuses connections
        let router = ChannelRouter::default().with_base_url("http://127.0.0.1:9/feed");
        let bytes = fetch_channel(&client, &router, Channel::L, Duration::from_secs(2)).await;
        assert!(bytes.is_none());
    }
}
