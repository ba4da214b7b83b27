// File: cbpoller-core/src/handlers/database.rs

use async_trait::async_trait;
use tracing::{debug, error};

use cbpoller_common::models::Event;
use cbpoller_common::traits::{EventHandler, TimeSeriesSink};

use crate::Error;

use super::flatten::flatten_event;

pub const DEFAULT_MEASUREMENT: &str = "chaturbate_events";

/// Stores every event as one flattened record in a time-series sink.
pub struct DatabaseHandler<S: TimeSeriesSink> {
    sink: S,
    measurement: String,
}

impl<S: TimeSeriesSink> DatabaseHandler<S> {
    pub fn new(sink: S) -> Self {
        Self::with_measurement(sink, DEFAULT_MEASUREMENT)
    }

    pub fn with_measurement(sink: S, measurement: impl Into<String>) -> Self {
        Self {
            sink,
            measurement: measurement.into(),
        }
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

#[async_trait]
impl<S: TimeSeriesSink> EventHandler for DatabaseHandler<S> {
    async fn handle(&self, event: &Event) -> Result<(), Error> {
        let record = flatten_event(event)?;
        if let Err(e) = self.sink.write(&self.measurement, &record).await {
            error!("Failed to store event {} in '{}': {}", event.id, self.measurement, e);
            return Err(e);
        }
        debug!("Stored event {} ({} fields)", event.id, record.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cbpoller_common::traits::{FieldValue, Record};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemorySink {
        rows: Mutex<Vec<(String, Record)>>,
        fail: bool,
    }

    #[async_trait]
    impl TimeSeriesSink for MemorySink {
        async fn write(&self, measurement: &str, record: &Record) -> Result<(), Error> {
            if self.fail {
                return Err(Error::Sink("write refused".into()));
            }
            self.rows.lock().unwrap().push((measurement.to_string(), record.clone()));
            Ok(())
        }
    }

    fn follow() -> Event {
        serde_json::from_str(r#"{"method":"follow","id":"9","object":{"broadcaster":"host"}}"#).unwrap()
    }

    #[tokio::test]
    async fn writes_under_default_measurement() -> Result<(), Error> {
        let handler = DatabaseHandler::new(MemorySink::default());
        handler.handle(&follow()).await?;

        let rows = handler.sink().rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "chaturbate_events");
        assert_eq!(rows[0].1.get("method"), Some(&FieldValue::Str("follow".into())));
        Ok(())
    }

    #[tokio::test]
    async fn sink_errors_propagate() {
        let sink = MemorySink { fail: true, ..Default::default() };
        let handler = DatabaseHandler::with_measurement(sink, "custom");
        assert_eq!(handler.measurement(), "custom");
        let err = handler.handle(&follow()).await.unwrap_err();
        assert!(matches!(err, Error::Sink(_)));
    }
}
