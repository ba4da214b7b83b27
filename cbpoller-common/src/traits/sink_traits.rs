// ========================================================
// File: cbpoller-common/src/traits/sink_traits.rs
// ========================================================

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::Error;

/// A single scalar in a flattened record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// Flat `key -> value` record; nested keys are joined with `.`.
pub type Record = BTreeMap<String, FieldValue>;

/// Time-series store that accepts one record per event.
#[async_trait]
pub trait TimeSeriesSink: Send + Sync {
    async fn write(&self, measurement: &str, record: &Record) -> Result<(), Error>;
}
