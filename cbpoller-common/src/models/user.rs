// File: cbpoller-common/src/models/user.rs

use serde::{Deserialize, Serialize};

/// Snapshot of a user as the Events API sends it with every event that
/// mentions one. Not a long-lived identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub in_fanclub: bool,
    pub has_tokens: bool,
    pub is_mod: bool,
    pub recent_tips: RecentTips,
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subgender: Option<String>,
}

/// How much the user has tipped recently, bucketed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecentTips {
    None,
    Some,
    Few,
    Lots,
    Tons,
}

impl RecentTips {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecentTips::None => "none",
            RecentTips::Some => "some",
            RecentTips::Few => "few",
            RecentTips::Lots => "lots",
            RecentTips::Tons => "tons",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "m")]
    Male,
    #[serde(rename = "f")]
    Female,
    #[serde(rename = "t")]
    Trans,
    #[serde(rename = "c")]
    Couple,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "m",
            Gender::Female => "f",
            Gender::Trans => "t",
            Gender::Couple => "c",
        }
    }
}
