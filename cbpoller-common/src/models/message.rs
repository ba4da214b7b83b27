// File: cbpoller-common/src/models/message.rs

use serde::{Deserialize, Serialize};

/// Body of a "chatMessage" or "privateMessage" event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub message: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub font: String,
    #[serde(default)]
    pub bg_color: Option<String>,
    #[serde(default)]
    pub from_user: Option<String>,
    #[serde(default)]
    pub to_user: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Chat,
    Private,
}

impl Message {
    /// A message is private when it names both a sender and a recipient.
    /// The API sends empty strings for the absent side of a chat message.
    pub fn is_private(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        present(&self.from_user) && present(&self.to_user)
    }

    pub fn kind(&self) -> MessageKind {
        if self.is_private() {
            MessageKind::Private
        } else {
            MessageKind::Chat
        }
    }
}
