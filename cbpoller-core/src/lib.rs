// src/lib.rs

pub mod client;
pub mod events;
pub mod handlers;
pub mod http;
pub mod retry;
pub mod sink;

pub use cbpoller_common::error::{DecodeError, Error};
pub use cbpoller_common::models;
pub use cbpoller_common::traits;
pub use cbpoller_common::traits::{EventHandler, TimeSeriesSink};
pub use client::{ClientConfig, ClientState, Environment, EventClient, RequestDeadline};
pub use http::{EventsTransport, RawResponse, ReqwestTransport, TransportError};
pub use retry::BackoffConfig;
