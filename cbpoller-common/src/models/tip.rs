// File: cbpoller-common/src/models/tip.rs

use std::fmt;

use serde::{Deserialize, Serialize};

/// "tip" payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tip {
    pub tokens: TipTokens,
    pub is_anon: bool,
    #[serde(default)]
    pub message: String,
}

/// Token count of a tip. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u64")]
pub struct TipTokens(u64);

impl TipTokens {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl TryFrom<i64> for TipTokens {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value < 1 {
            return Err(format!("tip tokens must be at least 1, got {value}"));
        }
        Ok(TipTokens(value as u64))
    }
}

impl From<TipTokens> for u64 {
    fn from(tokens: TipTokens) -> Self {
        tokens.0
    }
}

impl fmt::Display for TipTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
