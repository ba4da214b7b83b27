// File: cbpoller-core/tests/test_utils/mod.rs
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use cbpoller_core::models::Event;
use cbpoller_core::retry::{ConnectionPolicy, HttpStatusPolicy};
use cbpoller_core::{
    BackoffConfig, ClientConfig, Environment, Error, EventHandler, EventsTransport, RawResponse,
    TransportError,
};

pub const BASE: &str = "https://events.test";

pub fn test_config() -> ClientConfig {
    ClientConfig::new("caster", "tok")
        .with_environment(Environment::Custom(BASE.to_string()))
        .with_backoff(BackoffConfig::disabled())
}

/// Millisecond-scale backoff so retry tests stay fast.
pub fn quick_backoff(connection_tries: u32, http_tries: u32) -> BackoffConfig {
    BackoffConfig {
        connection: ConnectionPolicy {
            max_tries: connection_tries,
            interval: Duration::from_millis(1),
        },
        http: HttpStatusPolicy {
            max_tries: http_tries,
            base_delay: Duration::from_millis(1),
            factor: 2.0,
            max_delay: Duration::from_millis(5),
        },
    }
}

#[derive(Default)]
pub struct TransportLog {
    pub script: VecDeque<Result<RawResponse, TransportError>>,
    pub requested: Vec<String>,
    pub opened: u32,
    pub closed: u32,
}

/// Serves scripted responses in order and records every URL it is asked
/// for. Once the script runs out, `get` never completes.
#[derive(Clone, Default)]
pub struct FakeTransport {
    pub log: Arc<Mutex<TransportLog>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: &str) -> Self {
        self.log
            .lock()
            .unwrap()
            .script
            .push_back(Ok(RawResponse::new(status, body.to_string())));
        self
    }

    pub fn fail_connection(self, message: &str) -> Self {
        self.log.lock().unwrap().script.push_back(Err(TransportError::new(message)));
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.log.lock().unwrap().requested.clone()
    }

    pub fn opened(&self) -> u32 {
        self.log.lock().unwrap().opened
    }

    pub fn closed(&self) -> u32 {
        self.log.lock().unwrap().closed
    }
}

#[async_trait]
impl EventsTransport for FakeTransport {
    async fn open(&mut self) -> Result<(), Error> {
        self.log.lock().unwrap().opened += 1;
        Ok(())
    }

    async fn close(&mut self) {
        self.log.lock().unwrap().closed += 1;
    }

    async fn get(&self, url: String) -> Result<RawResponse, TransportError> {
        let next = {
            let mut log = self.log.lock().unwrap();
            log.requested.push(url);
            log.script.pop_front()
        };
        match next {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }
}

/// Remembers the id of every event it sees; optionally fails on one.
#[derive(Clone, Default)]
pub struct RecordingHandler {
    pub seen: Arc<Mutex<Vec<Event>>>,
    pub fail_on: Option<String>,
}

impl RecordingHandler {
    pub fn failing_on(id: &str) -> Self {
        Self {
            fail_on: Some(id.to_string()),
            ..Default::default()
        }
    }

    pub fn ids(&self) -> Vec<String> {
        self.seen.lock().unwrap().iter().map(|e| e.id.clone()).collect()
    }
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn handle(&self, event: &Event) -> Result<(), Error> {
        if self.fail_on.as_deref() == Some(event.id.as_str()) {
            return Err(Error::Handler(format!("refused event {}", event.id)));
        }
        self.seen.lock().unwrap().push(event.clone());
        Ok(())
    }
}

pub fn follow_event(id: &str) -> String {
    format!(r#"{{"method":"follow","id":"{id}","object":{{"broadcaster":"caster"}}}}"#)
}

pub fn tip_event(id: &str, tokens: i64) -> String {
    format!(
        r#"{{"method":"tip","id":"{id}","object":{{
            "broadcaster":"caster",
            "user":{{"username":"fan_1","inFanclub":false,"hasTokens":true,"isMod":false,"recentTips":"some","gender":"m"}},
            "tip":{{"tokens":{tokens},"isAnon":false,"message":"nice"}}}}}}"#
    )
}

pub fn batch(events: &[String], next_url: Option<&str>) -> String {
    let next = match next_url {
        Some(url) => format!("\"{url}\""),
        None => "null".to_string(),
    };
    format!(r#"{{"events":[{}],"nextUrl":{}}}"#, events.join(","), next)
}
