// File: cbpoller-common/src/models/mod.rs

pub mod event;
pub mod media;
pub mod message;
pub mod response;
pub mod tip;
pub mod user;

pub use event::*;
pub use media::*;
pub use message::*;
pub use response::*;
pub use tip::*;
pub use user::*;
