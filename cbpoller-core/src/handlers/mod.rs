// File: cbpoller-core/src/handlers/mod.rs

pub mod database;
pub mod flatten;
pub mod logging;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

use cbpoller_common::models::Event;
use cbpoller_common::traits::EventHandler;

use crate::sink::{InfluxSettings, InfluxSink};
use crate::Error;

pub use database::{DatabaseHandler, DEFAULT_MEASUREMENT};
pub use flatten::flatten_event;
pub use logging::{summarize, LoggingHandler};

/// Which built-in handler the binary should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandlerKind {
    #[default]
    Logging,
    Database,
}

impl HandlerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerKind::Logging => "logging",
            HandlerKind::Database => "database",
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HandlerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "logging" => Ok(HandlerKind::Logging),
            "database" => Ok(HandlerKind::Database),
            other => Err(Error::Config(format!(
                "unknown handler '{other}', expected 'logging' or 'database'"
            ))),
        }
    }
}

/// The built-in handlers.
pub enum Handler {
    Logging(LoggingHandler),
    Database(DatabaseHandler<InfluxSink>),
}

impl Handler {
    /// `Database` needs InfluxDB settings; `Logging` ignores them.
    pub fn build(kind: HandlerKind, influx: Option<&InfluxSettings>) -> Result<Self, Error> {
        match kind {
            HandlerKind::Logging => Ok(Handler::Logging(LoggingHandler::new())),
            HandlerKind::Database => {
                let settings = influx.ok_or_else(|| {
                    Error::Config("the database handler needs InfluxDB settings".into())
                })?;
                let sink = InfluxSink::new(settings)?;
                Ok(Handler::Database(DatabaseHandler::with_measurement(
                    sink,
                    settings.measurement.clone(),
                )))
            }
        }
    }

    pub fn kind(&self) -> HandlerKind {
        match self {
            Handler::Logging(_) => HandlerKind::Logging,
            Handler::Database(_) => HandlerKind::Database,
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn handle(&self, event: &Event) -> Result<(), Error> {
        match self {
            Handler::Logging(h) => h.handle(event).await,
            Handler::Database(h) => h.handle(event).await,
        }
    }
}
