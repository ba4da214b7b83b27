// File: cbpoller-core/src/client/runtime.rs

use std::collections::VecDeque;

use futures_util::stream::{self, Stream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use cbpoller_common::models::{Event, EventsApiResponse, NextUrl};
use cbpoller_common::traits::EventHandler;

use crate::events::decode;
use crate::http::{EventsTransport, ReqwestTransport};
use crate::retry::{with_retry, FetchFailure};
use crate::Error;

use super::ClientConfig;

/// Where the poll loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Idle,
    Connecting,
    Fetching,
    Decoding,
    Dispatching,
    ShuttingDown,
}

/// Long-poll client for a single broadcaster's event feed.
///
/// Owns the transport (and with it the connection pool) exclusively. The
/// cursor returned by each response is carried into the next fetch; when a
/// response has none, the next fetch starts from a freshly built URL.
pub struct EventClient<T: EventsTransport = ReqwestTransport> {
    config: ClientConfig,
    transport: T,
    state: ClientState,
    open: bool,
    cursor: Option<NextUrl>,
}

impl EventClient<ReqwestTransport> {
    /// Client backed by reqwest, with the local deadline taken from `config`.
    pub fn production(config: ClientConfig) -> Result<Self, Error> {
        let transport = ReqwestTransport::new(config.request_timeout());
        Self::new(config, transport)
    }
}

impl<T: EventsTransport> EventClient<T> {
    pub fn new(config: ClientConfig, transport: T) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            config,
            transport,
            state: ClientState::Idle,
            open: false,
            cursor: None,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Cursor the next `poll_once` will resume from.
    pub fn cursor(&self) -> Option<&NextUrl> {
        self.cursor.as_ref()
    }

    pub async fn open(&mut self) -> Result<(), Error> {
        if self.open {
            return Ok(());
        }
        self.state = ClientState::Connecting;
        if let Err(e) = self.transport.open().await {
            self.state = ClientState::Idle;
            return Err(e);
        }
        self.open = true;
        debug!("Events client opened for '{}'", self.config.username);
        Ok(())
    }

    pub async fn close(&mut self) {
        self.state = ClientState::ShuttingDown;
        self.transport.close().await;
        if self.open {
            self.open = false;
            debug!("Events client closed for '{}'", self.config.username);
        }
    }

    /// Fetch one batch, from `cursor` verbatim or from a fresh URL.
    ///
    /// Retryable failures are absorbed by the backoff policies; whatever
    /// comes back as `Err` is fatal. Fails with `ClientNotOpen` straight away
    /// if called before `open` or after `close`.
    pub async fn fetch_events(&mut self, cursor: Option<&NextUrl>) -> Result<EventsApiResponse, Error> {
        if !self.open {
            return Err(Error::ClientNotOpen);
        }

        let url = match cursor {
            Some(next) => next.as_str().to_string(),
            None => self.config.base_events_url(),
        };
        trace!("GET {}", self.config.redact(&url));

        self.state = ClientState::Fetching;
        let transport = &self.transport;
        let body = with_retry(&self.config.backoff, || fetch_once(transport, &url)).await?;

        self.state = ClientState::Decoding;
        let response = decode(&body)?;
        debug!(
            "Received {} event(s), next cursor present={}",
            response.events.len(),
            response.next_url.is_some()
        );
        Ok(response)
    }

    /// Fetch one batch from the held cursor and hand every event to
    /// `handler` in order, then advance the cursor. Returns the batch size.
    pub async fn poll_once<H>(&mut self, handler: &H) -> Result<usize, Error>
    where
        H: EventHandler + ?Sized,
    {
        let cursor = self.cursor.clone();
        let response = self.fetch_events(cursor.as_ref()).await?;

        self.state = ClientState::Dispatching;
        for event in &response.events {
            if let Err(e) = handler.handle(event).await {
                warn!("Handler failed on event {} ({}): {}", event.id, event.method, e);
                return Err(e);
            }
        }

        if response.next_url.is_none() {
            debug!("Response carried no nextUrl; next fetch starts from a fresh URL");
        }
        self.cursor = response.next_url;
        Ok(response.events.len())
    }

    /// Poll until `shutdown` fires or a fatal error occurs.
    ///
    /// The connection pool is released on every exit path. Cancellation
    /// drops whatever is in flight (a GET, a backoff sleep, or a handler
    /// call) and returns `Ok(())`.
    pub async fn run<H>(&mut self, handler: &H, shutdown: CancellationToken) -> Result<(), Error>
    where
        H: EventHandler + ?Sized,
    {
        if shutdown.is_cancelled() {
            return Ok(());
        }

        let outcome = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("Shutdown requested, stopping event loop");
                Ok(())
            }
            res = self.poll_forever(handler) => res,
        };

        self.close().await;
        outcome
    }

    async fn poll_forever<H>(&mut self, handler: &H) -> Result<(), Error>
    where
        H: EventHandler + ?Sized,
    {
        self.open().await?;
        info!(
            "Polling events for '{}' at {}",
            self.config.username,
            self.config.environment.base_url()
        );
        loop {
            self.poll_once(handler).await?;
        }
    }

    /// The same loop as a stream: events in delivery order, ending after
    /// the first error. A new batch is fetched only once the previous one
    /// has been fully consumed.
    pub fn events(self) -> impl Stream<Item = Result<Event, Error>> {
        struct Pager<T: EventsTransport> {
            client: EventClient<T>,
            pending: VecDeque<Event>,
            done: bool,
        }

        let pager = Pager {
            client: self,
            pending: VecDeque::new(),
            done: false,
        };

        stream::unfold(pager, |mut pager| async move {
            if pager.done {
                return None;
            }
            loop {
                if let Some(event) = pager.pending.pop_front() {
                    return Some((Ok(event), pager));
                }
                if let Err(e) = pager.client.open().await {
                    pager.done = true;
                    return Some((Err(e), pager));
                }
                let cursor = pager.client.cursor.clone();
                match pager.client.fetch_events(cursor.as_ref()).await {
                    Ok(response) => {
                        pager.client.cursor = response.next_url;
                        pager.pending.extend(response.events);
                    }
                    Err(e) => {
                        pager.done = true;
                        pager.client.close().await;
                        return Some((Err(e), pager));
                    }
                }
            }
        })
    }
}

/// One GET, with non-2xx statuses turned into failures for the policies.
async fn fetch_once<T: EventsTransport>(transport: &T, url: &str) -> Result<Vec<u8>, FetchFailure> {
    let response = transport
        .get(url.to_string())
        .await
        .map_err(|e| FetchFailure::Connection { message: e.to_string() })?;

    if response.is_success() {
        Ok(response.body)
    } else {
        Err(FetchFailure::Status {
            status: response.status,
            body: response.body_text(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{MockEventsTransport, RawResponse, TransportError};
    use crate::retry::BackoffConfig;
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn config() -> ClientConfig {
        ClientConfig::new("u", "t")
            .with_environment(crate::Environment::Custom("https://x".into()))
            .with_backoff(BackoffConfig::disabled())
    }

    #[tokio::test]
    async fn fetch_before_open_is_rejected_without_io() {
        let mut transport = MockEventsTransport::new();
        transport.expect_get().never();
        let mut client = EventClient::new(config(), transport).unwrap();
        assert!(matches!(client.fetch_events(None).await, Err(Error::ClientNotOpen)));
    }

    #[tokio::test]
    async fn follows_cursor_then_falls_back() -> Result<(), Error> {
        let mut seq = Sequence::new();
        let mut transport = MockEventsTransport::new();
        transport.expect_open().times(1).returning(|| Ok(()));
        transport
            .expect_get()
            .with(eq("https://x/events/u/t/?timeout=10".to_string()))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(RawResponse::new(200, r#"{"events":[],"nextUrl":"https://x/events/u/t/?i=1"}"#))
            });
        transport
            .expect_get()
            .with(eq("https://x/events/u/t/?i=1".to_string()))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(RawResponse::new(200, r#"{"events":[],"nextUrl":null}"#)));
        transport
            .expect_get()
            .with(eq("https://x/events/u/t/?timeout=10".to_string()))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(RawResponse::new(200, r#"{"events":[]}"#)));
        transport.expect_close().returning(|| ());

        struct Ignore;
        #[async_trait::async_trait]
        impl EventHandler for Ignore {
            async fn handle(&self, _: &Event) -> Result<(), Error> {
                Ok(())
            }
        }

        let mut client = EventClient::new(config(), transport)?;
        client.open().await?;
        client.poll_once(&Ignore).await?;
        assert_eq!(client.cursor().map(NextUrl::as_str), Some("https://x/events/u/t/?i=1"));
        client.poll_once(&Ignore).await?;
        assert!(client.cursor().is_none());
        client.poll_once(&Ignore).await?;
        client.close().await;
        assert_eq!(client.state(), ClientState::ShuttingDown);
        Ok(())
    }

    #[tokio::test]
    async fn connection_failure_with_disabled_backoff_is_fatal_at_once() {
        let mut transport = MockEventsTransport::new();
        transport.expect_open().returning(|| Ok(()));
        transport
            .expect_get()
            .times(1)
            .returning(|_| Err(TransportError::new("connection reset by peer")));

        let mut client = EventClient::new(config(), transport).unwrap();
        client.open().await.unwrap();
        let err = client.fetch_events(None).await.unwrap_err();
        assert!(matches!(err, Error::Unhandled { attempts: 1, status: None, .. }));
    }

    #[tokio::test]
    async fn decode_failures_are_not_retried() {
        let mut transport = MockEventsTransport::new();
        transport.expect_open().returning(|| Ok(()));
        transport
            .expect_get()
            .times(1)
            .returning(|_| Ok(RawResponse::new(200, r#"{"nextUrl":null}"#)));

        let cfg = config().with_backoff(BackoffConfig::default());
        let mut client = EventClient::new(cfg, transport).unwrap();
        client.open().await.unwrap();
        let err = client.fetch_events(None).await.unwrap_err();
        match err {
            Error::Decode(e) => assert!(e.message().contains("events"), "{e}"),
            other => panic!("expected decode error, got {other:?}"),
        }
        assert_eq!(client.state(), ClientState::Decoding);
    }
}
