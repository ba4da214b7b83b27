//! Retry and backoff for a single fetch.
//!
//! Two policies compose as ordinary control flow: the connection policy
//! loop wraps the HTTP status policy loop, which wraps one GET. Decisions are
//! pure functions of `(failure, attempt)`; only [`with_retry`] sleeps.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error};

use crate::Error;

/// Longest slice of a response body kept in error messages.
const MAX_BODY_IN_CAUSE: usize = 256;

/// Why one GET did not produce a 2xx body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// No HTTP status was received.
    Connection { message: String },
    /// A response arrived with a non-2xx status.
    Status { status: u16, body: String },
}

impl FetchFailure {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchFailure::Status { status, .. } => Some(*status),
            FetchFailure::Connection { .. } => None,
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Connection { message } => write!(f, "{message}"),
            FetchFailure::Status { status, body } if body.is_empty() => write!(f, "HTTP {status}"),
            FetchFailure::Status { status, body } => {
                write!(f, "HTTP {status}: {}", truncate(body, MAX_BODY_IN_CAUSE))
            }
        }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn is_server_error(status: u16) -> bool {
    (500..=599).contains(&status)
}

/// Whether the HTTP status policy retries this failure.
///
/// Only server-class statuses qualify. Connection failures return `false`
/// here because the connection policy classifies them on its own.
pub fn need_retry(failure: &FetchFailure) -> bool {
    matches!(failure, FetchFailure::Status { status, .. } if is_server_error(*status))
}

/// Typed error for a failure the policies stopped retrying.
pub fn classify_give_up(failure: &FetchFailure, attempts: u32) -> Error {
    match failure {
        FetchFailure::Status { status: 401, body } => Error::Authentication {
            status: 401,
            body: truncate(body, MAX_BODY_IN_CAUSE).to_string(),
        },
        FetchFailure::Status { status: 403, body } => Error::Forbidden {
            status: 403,
            body: truncate(body, MAX_BODY_IN_CAUSE).to_string(),
        },
        FetchFailure::Status { status: 404, body } => Error::NotFound {
            status: 404,
            body: truncate(body, MAX_BODY_IN_CAUSE).to_string(),
        },
        FetchFailure::Status { status, .. } => Error::Unhandled {
            attempts,
            status: Some(*status),
            cause: failure.to_string(),
        },
        FetchFailure::Connection { message } => Error::Unhandled {
            attempts,
            status: None,
            cause: message.clone(),
        },
    }
}

#[derive(Debug)]
pub enum RetryDecision {
    Retry { delay: Duration },
    GiveUp(Error),
}

impl RetryDecision {
    pub fn is_retry(&self) -> bool {
        matches!(self, RetryDecision::Retry { .. })
    }
}

/// Constant delay for connection-level failures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionPolicy {
    pub max_tries: u32,
    pub interval: Duration,
}

impl Default for ConnectionPolicy {
    fn default() -> Self {
        Self {
            max_tries: 10,
            interval: Duration::from_secs(2),
        }
    }
}

impl ConnectionPolicy {
    pub fn decide(&self, failure: &FetchFailure, attempt: u32) -> RetryDecision {
        match failure {
            FetchFailure::Connection { .. } if attempt < self.max_tries => RetryDecision::Retry {
                delay: self.interval,
            },
            _ => RetryDecision::GiveUp(classify_give_up(failure, attempt)),
        }
    }
}

/// Exponential delay for server-class statuses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HttpStatusPolicy {
    pub max_tries: u32,
    pub base_delay: Duration,
    pub factor: f64,
    pub max_delay: Duration,
}

impl Default for HttpStatusPolicy {
    fn default() -> Self {
        Self {
            max_tries: 6,
            base_delay: Duration::from_secs(1),
            factor: 2.0,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl HttpStatusPolicy {
    /// Delay after failed attempt `attempt` (1-based): `base * factor^(attempt-1)`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(64) as i32;
        let secs = self.base_delay.as_secs_f64() * self.factor.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    pub fn decide(&self, failure: &FetchFailure, attempt: u32) -> RetryDecision {
        // 401/403/404 and every other 4xx fall through to give-up untried.
        if !need_retry(failure) {
            return RetryDecision::GiveUp(classify_give_up(failure, attempt));
        }
        if attempt < self.max_tries {
            RetryDecision::Retry {
                delay: self.delay_for_attempt(attempt),
            }
        } else {
            RetryDecision::GiveUp(classify_give_up(failure, attempt))
        }
    }
}

/// Both policies, owned by one client.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BackoffConfig {
    pub connection: ConnectionPolicy,
    pub http: HttpStatusPolicy,
}

impl BackoffConfig {
    /// One attempt, no delay, for either failure class.
    pub fn disabled() -> Self {
        Self {
            connection: ConnectionPolicy {
                max_tries: 1,
                interval: Duration::ZERO,
            },
            http: HttpStatusPolicy {
                max_tries: 1,
                base_delay: Duration::ZERO,
                factor: 1.0,
                max_delay: Duration::ZERO,
            },
        }
    }
}

/// Outcome of the inner loop that the outer loop has to act on.
enum Escalation {
    Connection(FetchFailure),
    Fatal(Error),
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        sleep(delay).await;
    }
}

async fn retry_statuses<F, Fut, T>(policy: &HttpStatusPolicy, op: &mut F) -> Result<T, Escalation>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchFailure>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        let failure = match op().await {
            Ok(value) => return Ok(value),
            Err(failure @ FetchFailure::Connection { .. }) => {
                return Err(Escalation::Connection(failure));
            }
            Err(failure) => failure,
        };

        match policy.decide(&failure, attempt) {
            RetryDecision::Retry { delay } => {
                debug!(
                    attempt,
                    status = failure.status(),
                    "Backing off {:.1}s after server error: {}",
                    delay.as_secs_f64(),
                    failure
                );
                pause(delay).await;
            }
            RetryDecision::GiveUp(err) => {
                error!(
                    attempts = attempt,
                    status = failure.status(),
                    "Giving up on events request: {}",
                    failure
                );
                return Err(Escalation::Fatal(err));
            }
        }
    }
}

/// Run `op` under the connection policy wrapped around the status policy.
///
/// Returns the first success, or the typed error of the first give-up.
pub async fn with_retry<F, Fut, T>(config: &BackoffConfig, mut op: F) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchFailure>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        let failure = match retry_statuses(&config.http, &mut op).await {
            Ok(value) => return Ok(value),
            Err(Escalation::Fatal(err)) => return Err(err),
            Err(Escalation::Connection(failure)) => failure,
        };

        match config.connection.decide(&failure, attempt) {
            RetryDecision::Retry { delay } => {
                debug!(
                    attempt,
                    "Backing off {:.1}s after connection failure: {}",
                    delay.as_secs_f64(),
                    failure
                );
                pause(delay).await;
            }
            RetryDecision::GiveUp(err) => {
                error!(attempts = attempt, "Giving up after connection failures: {}", failure);
                return Err(err);
            }
        }
    }
}
