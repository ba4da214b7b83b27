// File: cbpoller-common/src/models/media.rs

use serde::{Deserialize, Serialize};

/// "mediaPurchase" payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub id: u64,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub name: String,
    pub tokens: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Photos,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Photos => "photos",
            MediaType::Video => "video",
        }
    }
}
