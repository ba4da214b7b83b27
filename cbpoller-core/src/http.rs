//! HTTP transport for the events feed.
//!
//! The poll loop talks to the network only through [`EventsTransport`], so
//! tests can script responses without a server. [`ReqwestTransport`] is the
//! production implementation and owns the single reqwest connection pool for
//! the lifetime of an open client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use thiserror::Error;
use tracing::trace;

use crate::Error;

/// Status and body of a completed HTTP exchange, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Connection-level failure: refused, reset, read error, or local deadline.
/// No HTTP status was received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        TransportError(message.into())
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL embeds the API token.
        let err = err.without_url();
        if err.is_timeout() {
            TransportError(format!("request deadline elapsed: {err}"))
        } else {
            TransportError(format!("connection error: {err}"))
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventsTransport: Send + Sync {
    /// Acquire the connection pool.
    async fn open(&mut self) -> Result<(), Error>;

    /// Release the connection pool. Must be safe to call twice.
    async fn close(&mut self);

    async fn get(&self, url: String) -> Result<RawResponse, TransportError>;
}

pub struct ReqwestTransport {
    request_timeout: Option<Duration>,
    client: Option<ReqwestClient>,
}

impl ReqwestTransport {
    /// `request_timeout` is the local deadline per GET; `None` leaves the
    /// duration to the server's long-poll timeout.
    pub fn new(request_timeout: Option<Duration>) -> Self {
        Self {
            request_timeout,
            client: None,
        }
    }
}

#[async_trait]
impl EventsTransport for ReqwestTransport {
    async fn open(&mut self) -> Result<(), Error> {
        if self.client.is_some() {
            return Ok(());
        }
        let mut builder = ReqwestClient::builder()
            .user_agent(concat!("cbpoller/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        self.client = Some(builder.build()?);
        trace!("reqwest connection pool created");
        Ok(())
    }

    async fn close(&mut self) {
        if self.client.take().is_some() {
            trace!("reqwest connection pool released");
        }
    }

    async fn get(&self, url: String) -> Result<RawResponse, TransportError> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| TransportError::new("transport is closed"))?;

        let resp = client.get(&url).send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?;
        Ok(RawResponse::new(status, body.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range_is_2xx() {
        assert!(RawResponse::new(200, "").is_success());
        assert!(RawResponse::new(204, "").is_success());
        assert!(!RawResponse::new(301, "").is_success());
        assert!(!RawResponse::new(500, "").is_success());
    }

    #[tokio::test]
    async fn closed_transport_refuses_requests() {
        let transport = ReqwestTransport::new(None);
        let err = transport.get("http://127.0.0.1:1/".into()).await.unwrap_err();
        assert_eq!(err, TransportError::new("transport is closed"));
    }

    #[tokio::test]
    async fn open_and_close_are_idempotent() -> Result<(), Error> {
        let mut transport = ReqwestTransport::new(Some(Duration::from_secs(1)));
        transport.open().await?;
        transport.open().await?;
        assert!(transport.client.is_some());
        transport.close().await;
        transport.close().await;
        assert!(transport.client.is_none());
        Ok(())
    }
}
