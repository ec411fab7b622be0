//! # Transport
//!
//! The network seam. [`HttpTransport`] streams a response body with reqwest,
//! reporting best-effort monotone progress percentages; tests substitute
//! their own [`Transport`] implementations.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use crate::config::WebstashConfig;
use crate::error::FetchError;
use crate::request::{OnProgress, PayloadKind};

/// Performs the actual network download for a fetch request.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Download the resource at `url`, invoking `progress` with whole
    /// percentages as data arrives. Progress is monotonically non-decreasing
    /// and best-effort; consumers may ignore it.
    async fn fetch(
        &self,
        url: &Url,
        kind: PayloadKind,
        progress: Option<&OnProgress>,
    ) -> Result<Bytes, FetchError>;
}

/// Create a reqwest Client with the provided configuration
pub fn create_client(config: &WebstashConfig) -> Result<Client, FetchError> {
    let mut client_builder = Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(config.headers.clone())
        .redirect(if config.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        });

    if !config.timeout.is_zero() {
        client_builder = client_builder.timeout(config.timeout);
    }

    if !config.connect_timeout.is_zero() {
        client_builder = client_builder.connect_timeout(config.connect_timeout);
    }

    client_builder.build().map_err(FetchError::from)
}

/// HTTP transport backed by a shared reqwest client.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &WebstashConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: create_client(config)?,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(
        &self,
        url: &Url,
        kind: PayloadKind,
        progress: Option<&OnProgress>,
    ) -> Result<Bytes, FetchError> {
        info!(url = %url, kind = ?kind, "starting download request");

        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let total = response.content_length();
        match total {
            Some(size) => debug!(url = %url, size, "download size information available"),
            None => debug!(url = %url, "content length not available"),
        }

        let mut buf = BytesMut::with_capacity(total.unwrap_or(0) as usize);
        let mut last_percent = 0u8;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            buf.extend_from_slice(&chunk);

            if let (Some(callback), Some(total)) = (progress, total) {
                if total > 0 {
                    let percent = ((buf.len() as u64 * 100) / total).min(100) as u8;
                    if percent > last_percent {
                        last_percent = percent;
                        callback(percent);
                    }
                }
            }
        }

        debug!(url = %url, size = buf.len(), "download complete");
        Ok(buf.freeze())
    }
}
