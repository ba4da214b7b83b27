// File: cbpoller-core/src/sink/influx.rs
//
// InfluxDB v2 writer speaking line protocol over reqwest.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client as ReqwestClient;
use tracing::{debug, trace, warn};
use url::Url;

use cbpoller_common::traits::{FieldValue, Record, TimeSeriesSink};

use crate::handlers::DEFAULT_MEASUREMENT;
use crate::Error;

const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, PartialEq, Eq)]
pub struct InfluxSettings {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
    pub measurement: String,
}

impl InfluxSettings {
    pub fn new(
        url: impl Into<String>,
        token: impl Into<String>,
        org: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            org: org.into(),
            bucket: bucket.into(),
            measurement: DEFAULT_MEASUREMENT.to_string(),
        }
    }

    /// `{url}/api/v2/write?org=..&bucket=..&precision=ns`
    pub fn write_url(&self) -> Result<Url, Error> {
        let base = self.url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/api/v2/write"))
            .map_err(|e| Error::Config(format!("invalid InfluxDB url '{}': {e}", self.url)))?;
        url.query_pairs_mut()
            .append_pair("org", &self.org)
            .append_pair("bucket", &self.bucket)
            .append_pair("precision", "ns");
        Ok(url)
    }
}

impl fmt::Debug for InfluxSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfluxSettings")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("org", &self.org)
            .field("bucket", &self.bucket)
            .field("measurement", &self.measurement)
            .finish()
    }
}

pub struct InfluxSink {
    client: ReqwestClient,
    write_url: Url,
    auth_header: String,
}

impl InfluxSink {
    pub fn new(settings: &InfluxSettings) -> Result<Self, Error> {
        for (name, value) in [
            ("url", &settings.url),
            ("token", &settings.token),
            ("org", &settings.org),
            ("bucket", &settings.bucket),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("InfluxDB {name} must not be empty")));
            }
        }
        let write_url = settings.write_url()?;
        let client = ReqwestClient::builder().timeout(WRITE_TIMEOUT).build()?;
        debug!("InfluxDB sink writing to {}", write_url);
        Ok(Self {
            client,
            write_url,
            auth_header: format!("Token {}", settings.token),
        })
    }

    pub fn write_url(&self) -> &Url {
        &self.write_url
    }
}

#[async_trait]
impl TimeSeriesSink for InfluxSink {
    async fn write(&self, measurement: &str, record: &Record) -> Result<(), Error> {
        let timestamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let Some(line) = encode_line(measurement, record, timestamp) else {
            warn!("Skipping empty record for '{}'", measurement);
            return Ok(());
        };
        trace!("influx line: {}", line);

        let resp = self
            .client
            .post(self.write_url.clone())
            .header(reqwest::header::AUTHORIZATION, &self.auth_header)
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(line)
            .send()
            .await
            .map_err(|e| Error::Sink(format!("InfluxDB write failed: {}", e.without_url())))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(Error::Sink(format!("InfluxDB write returned {}: {}", status.as_u16(), body.trim())))
    }
}

/// Measurement names and keys: `specials` and newlines get a backslash.
fn escape_name(raw: &str, specials: &[char]) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            c if specials.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// String field values: only `"` and `\` are escaped.
fn escape_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn encode_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Str(s) => format!("\"{}\"", escape_string(s)),
        FieldValue::Int(i) => format!("{i}i"),
        FieldValue::Float(f) => {
            if f.is_finite() {
                format!("{f:?}")
            } else {
                "0.0".to_string()
            }
        }
        FieldValue::Bool(b) => b.to_string(),
    }
}

/// One line-protocol line with every entry of `record` as a field, or
/// `None` for an empty record.
pub fn encode_line(measurement: &str, record: &Record, timestamp_ns: i64) -> Option<String> {
    if record.is_empty() {
        return None;
    }
    let fields = record
        .iter()
        .map(|(k, v)| format!("{}={}", escape_name(k, &[',', '=', ' ']), encode_value(v)))
        .collect::<Vec<_>>()
        .join(",");
    Some(format!("{} {} {}", escape_name(measurement, &[',', ' ']), fields, timestamp_ns))
}
