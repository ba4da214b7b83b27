// File: cbpoller-common/src/models/event.rs

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Media, Message, Tip, User};

/// The closed set of event kinds the Events API delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventMethod {
    BroadcastStart,
    BroadcastStop,
    UserEnter,
    UserLeave,
    Follow,
    Unfollow,
    FanclubJoin,
    ChatMessage,
    PrivateMessage,
    Tip,
    RoomSubjectChange,
    MediaPurchase,
}

impl EventMethod {
    pub const ALL: [EventMethod; 12] = [
        EventMethod::BroadcastStart,
        EventMethod::BroadcastStop,
        EventMethod::UserEnter,
        EventMethod::UserLeave,
        EventMethod::Follow,
        EventMethod::Unfollow,
        EventMethod::FanclubJoin,
        EventMethod::ChatMessage,
        EventMethod::PrivateMessage,
        EventMethod::Tip,
        EventMethod::RoomSubjectChange,
        EventMethod::MediaPurchase,
    ];

    /// Wire name, e.g. `"roomSubjectChange"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventMethod::BroadcastStart => "broadcastStart",
            EventMethod::BroadcastStop => "broadcastStop",
            EventMethod::UserEnter => "userEnter",
            EventMethod::UserLeave => "userLeave",
            EventMethod::Follow => "follow",
            EventMethod::Unfollow => "unfollow",
            EventMethod::FanclubJoin => "fanclubJoin",
            EventMethod::ChatMessage => "chatMessage",
            EventMethod::PrivateMessage => "privateMessage",
            EventMethod::Tip => "tip",
            EventMethod::RoomSubjectChange => "roomSubjectChange",
            EventMethod::MediaPurchase => "mediaPurchase",
        }
    }
}

impl fmt::Display for EventMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `object` of an event. Which fields are filled depends on the method,
/// but each one is optional on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broadcaster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip: Option<Tip>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Media>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

/// One notification from the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub method: EventMethod,
    #[serde(default)]
    pub object: EventObject,
    pub id: String,
}

impl Event {
    pub fn broadcaster(&self) -> Option<&str> {
        self.object.broadcaster.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.object.user.as_ref()
    }

    pub fn tip(&self) -> Option<&Tip> {
        self.object.tip.as_ref()
    }

    pub fn media(&self) -> Option<&Media> {
        self.object.media.as_ref()
    }

    pub fn message(&self) -> Option<&Message> {
        self.object.message.as_ref()
    }

    pub fn subject(&self) -> Option<&str> {
        self.object.subject.as_deref()
    }
}
