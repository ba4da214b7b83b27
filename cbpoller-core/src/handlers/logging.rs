// File: cbpoller-core/src/handlers/logging.rs

use async_trait::async_trait;
use tracing::info;

use cbpoller_common::models::{Event, EventMethod, MessageKind};
use cbpoller_common::traits::EventHandler;

use crate::Error;

/// Writes one `info!` line per event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHandler;

impl LoggingHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventHandler for LoggingHandler {
    async fn handle(&self, event: &Event) -> Result<(), Error> {
        info!(event_id = %event.id, method = %event.method, "{}", summarize(event));
        Ok(())
    }
}

fn who(event: &Event) -> &str {
    event.user().map(|u| u.username.as_str()).unwrap_or("unknown user")
}

/// Human readable one-liner for an event.
pub fn summarize(event: &Event) -> String {
    match event.method {
        EventMethod::BroadcastStart => {
            format!("{} started broadcasting", event.broadcaster().unwrap_or("broadcaster"))
        }
        EventMethod::BroadcastStop => {
            format!("{} stopped broadcasting", event.broadcaster().unwrap_or("broadcaster"))
        }
        EventMethod::UserEnter => format!("{} entered the room", who(event)),
        EventMethod::UserLeave => format!("{} left the room", who(event)),
        EventMethod::Follow => format!("{} followed", who(event)),
        EventMethod::Unfollow => format!("{} unfollowed", who(event)),
        EventMethod::FanclubJoin => format!("{} joined the fan club", who(event)),
        EventMethod::ChatMessage | EventMethod::PrivateMessage => match event.message() {
            Some(msg) if msg.kind() == MessageKind::Private => format!(
                "private message {} -> {}: {}",
                msg.from_user.as_deref().unwrap_or(who(event)),
                msg.to_user.as_deref().unwrap_or("?"),
                msg.message
            ),
            Some(msg) => format!("{}: {}", who(event), msg.message),
            None => format!("{} sent an empty message", who(event)),
        },
        EventMethod::Tip => match event.tip() {
            Some(tip) => {
                let from = if tip.is_anon { "anonymous" } else { who(event) };
                if tip.message.is_empty() {
                    format!("{} tipped {} tokens", from, tip.tokens)
                } else {
                    format!("{} tipped {} tokens: {}", from, tip.tokens, tip.message)
                }
            }
            None => format!("{} tipped", who(event)),
        },
        EventMethod::RoomSubjectChange => {
            format!("room subject changed to '{}'", event.subject().unwrap_or_default())
        }
        EventMethod::MediaPurchase => match event.media() {
            Some(media) => format!(
                "{} purchased {} '{}' for {} tokens",
                who(event),
                media.media_type.as_str(),
                media.name,
                media.tokens
            ),
            None => format!("{} purchased media", who(event)),
        },
    }
}
