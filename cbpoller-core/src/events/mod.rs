// File: cbpoller-core/src/events/mod.rs

pub mod decoder;

pub use decoder::{decode, decode_str};
