// ========================================================
// File: cbpoller-common/src/traits/handler_traits.rs
// ========================================================

use std::sync::Arc;

use async_trait::async_trait;

use crate::models::Event;
use crate::Error;

/// Consumer of decoded events.
///
/// The poll loop awaits each call before handing over the next event, so an
/// implementation never sees two events at once. An `Err` is not retried; it
/// ends the loop.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &Event) -> Result<(), Error>;
}

#[async_trait]
impl<T: EventHandler + ?Sized> EventHandler for Arc<T> {
    async fn handle(&self, event: &Event) -> Result<(), Error> {
        (**self).handle(event).await
    }
}

#[async_trait]
impl<T: EventHandler + ?Sized> EventHandler for Box<T> {
    async fn handle(&self, event: &Event) -> Result<(), Error> {
        (**self).handle(event).await
    }
}
