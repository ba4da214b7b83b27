// File: cbpoller-core/src/client/mod.rs

pub mod config;
pub mod runtime;

pub use config::{ClientConfig, Environment, RequestDeadline};
pub use runtime::{ClientState, EventClient};
