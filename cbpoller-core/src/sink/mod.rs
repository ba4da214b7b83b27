// File: cbpoller-core/src/sink/mod.rs

pub mod influx;

pub use influx::{encode_line, InfluxSettings, InfluxSink};
