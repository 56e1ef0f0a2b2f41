//! HTTP transport used by the ranged downloader
//!
//! [`HttpTransport`] is the minimal surface the downloader needs: a HEAD that
//! reports size and the URL redirects settled on, and a ranged GET returning
//! status plus a body stream. [`ReqwestTransport`] is the production client.

use crate::config::Config;
use crate::error::TransportError;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::header::RANGE;
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Response body as a stream of chunks
pub type BodyStream = BoxStream<'static, Result<Bytes, TransportError>>;

/// Outcome of a HEAD request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadResponse {
    /// `Content-Length` reported by the server, if any
    pub content_length: Option<u64>,
    /// URL after following the redirect chain
    pub final_url: String,
}

/// Outcome of a ranged GET, before the body is read
pub struct RangeResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: BodyStream,
}

impl std::fmt::Debug for RangeResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Asynchronous HTTP client abstraction.
///
/// Implementations follow redirects themselves and classify every failure
/// through [`TransportError`] so the caller can decide whether to retry.
pub trait HttpTransport: Send + Sync + 'static {
    /// Issue `HEAD url`, following redirects.
    fn head(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<HeadResponse, TransportError>> + Send;

    /// Issue `GET url` with the given `Range` header value.
    fn get_range(
        &self,
        url: &str,
        range_header: &str,
    ) -> impl Future<Output = Result<RangeResponse, TransportError>> + Send;
}

/// Production transport on top of `reqwest`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Wrap an existing client
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a transport tuned for large parallel downloads.
    ///
    /// Features:
    /// - Connection pooling sized for one connection per range
    /// - TCP keep-alive and no-delay
    /// - Connect and read timeouts, but no whole-request timeout so a slow
    ///   multi-gigabyte range is not cut off
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, TransportError> {
        let client = Client::builder()
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .pool_max_idle_per_host(usize::try_from(config.ranges).unwrap_or(usize::MAX))
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(config.connect_timeout())
            .read_timeout(config.read_timeout())
            .build()
            .map_err(|e| TransportError::fatal(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self::new(client))
    }
}

impl HttpTransport for ReqwestTransport {
    async fn head(&self, url: &str) -> Result<HeadResponse, TransportError> {
        let response = self.client.head(url).send().await?;
        let content_length = response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());

        Ok(HeadResponse {
            content_length,
            final_url: response.url().to_string(),
        })
    }

    async fn get_range(
        &self,
        url: &str,
        range_header: &str,
    ) -> Result<RangeResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .header(RANGE, range_header)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(TransportError::from));

        Ok(RangeResponse {
            status,
            body: Box::pin(body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_builds_client() {
        assert!(ReqwestTransport::from_config(&Config::default()).is_ok());
    }

    #[tokio::test]
    async fn test_head_against_closed_port_is_transient() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let client = Client::builder().no_proxy().build().unwrap();
        let transport = ReqwestTransport::new(client);

        let err = transport
            .head(&format!("http://127.0.0.1:{port}/file"))
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }
}
