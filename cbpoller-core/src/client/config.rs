// File: cbpoller-core/src/client/config.rs

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::retry::BackoffConfig;
use crate::Error;

pub const PRODUCTION_BASE_URL: &str = "https://eventsapi.chaturbate.com";
pub const TESTBED_BASE_URL: &str = "https://events.testbed.cb.dev";

/// Extra time on top of the long-poll timeout before the local deadline
/// fires, so a server that answers right at its timeout is not cut off.
const DEADLINE_GRACE: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Production,
    Testbed,
    /// Any other deployment, e.g. a local mock server.
    Custom(String),
}

impl Environment {
    pub fn base_url(&self) -> &str {
        match self {
            Environment::Production => PRODUCTION_BASE_URL,
            Environment::Testbed => TESTBED_BASE_URL,
            Environment::Custom(url) => url.trim_end_matches('/'),
        }
    }
}

/// Local deadline applied to each GET, distinct from the server-side
/// long-poll timeout sent as a query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestDeadline {
    /// Long-poll timeout plus a grace period.
    #[default]
    Auto,
    Fixed(Duration),
    /// Let the server's long-poll decide how long a request lasts.
    Disabled,
}

/// Everything the client needs, passed in explicitly by the embedding
/// application.
#[derive(Clone)]
pub struct ClientConfig {
    pub username: String,
    pub token: String,
    /// Server-side long-poll timeout in seconds. Must not be negative.
    pub timeout_secs: i64,
    pub environment: Environment,
    pub backoff: BackoffConfig,
    pub deadline: RequestDeadline,
}

impl ClientConfig {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
            timeout_secs: 10,
            environment: Environment::Production,
            backoff: BackoffConfig::default(),
            deadline: RequestDeadline::Auto,
        }
    }

    pub fn with_timeout(mut self, timeout_secs: i64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_deadline(mut self, deadline: RequestDeadline) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.username.trim().is_empty() {
            return Err(Error::Construction("username must not be empty".into()));
        }
        if self.token.trim().is_empty() {
            return Err(Error::Construction("token must not be empty".into()));
        }
        if self.timeout_secs < 0 {
            return Err(Error::Construction(format!(
                "timeout must be a non-negative integer, got {}",
                self.timeout_secs
            )));
        }
        if let Environment::Custom(base) = &self.environment {
            let url = Url::parse(base)
                .map_err(|e| Error::Construction(format!("invalid base URL {base:?}: {e}")))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::Construction(format!(
                    "base URL must be http(s), got {base:?}"
                )));
            }
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        match self.deadline {
            RequestDeadline::Auto => {
                Some(Duration::from_secs(self.timeout_secs.max(0) as u64) + DEADLINE_GRACE)
            }
            RequestDeadline::Fixed(d) => Some(d),
            RequestDeadline::Disabled => None,
        }
    }

    /// Fresh feed URL, used whenever no cursor is held.
    pub fn base_events_url(&self) -> String {
        format!(
            "{}/events/{}/{}/?timeout={}",
            self.environment.base_url(),
            urlencoding::encode(&self.username),
            urlencoding::encode(&self.token),
            self.timeout_secs
        )
    }

    /// `url` with the token masked, for log lines.
    pub fn redact(&self, url: &str) -> String {
        let encoded = urlencoding::encode(&self.token);
        url.replace(encoded.as_ref(), "REDACTED")
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("username", &self.username)
            .field("token", &"REDACTED")
            .field("timeout_secs", &self.timeout_secs)
            .field("environment", &self.environment)
            .field("backoff", &self.backoff)
            .field("deadline", &self.deadline)
            .finish()
    }
}
