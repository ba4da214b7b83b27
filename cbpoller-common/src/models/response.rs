// File: cbpoller-common/src/models/response.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use super::Event;

/// One page of the feed: events in delivery order plus where to resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsApiResponse {
    pub events: Vec<Event>,
    #[serde(default)]
    pub next_url: Option<NextUrl>,
}

/// Server-supplied cursor. Opaque to the client and kept verbatim; only
/// checked to be an absolute http(s) URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NextUrl(String);

impl NextUrl {
    pub fn parse(raw: impl Into<String>) -> Result<Self, String> {
        Self::try_from(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NextUrl {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        let parsed = Url::parse(&raw).map_err(|e| format!("invalid nextUrl {raw:?}: {e}"))?;
        match parsed.scheme() {
            "http" | "https" => {}
            other => return Err(format!("nextUrl must be http(s), got scheme {other:?}")),
        }
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(format!("nextUrl {raw:?} has no host"));
        }
        Ok(NextUrl(raw))
    }
}

impl From<NextUrl> for String {
    fn from(url: NextUrl) -> Self {
        url.0
    }
}

impl fmt::Display for NextUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
