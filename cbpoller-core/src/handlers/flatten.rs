// File: cbpoller-core/src/handlers/flatten.rs
//
// Event -> flat record for time-series storage.

use serde_json::Value;

use cbpoller_common::models::Event;
use cbpoller_common::traits::{FieldValue, Record};

use crate::Error;

/// Flattens `event` into dotted keys.
///
/// `method` and `id` sit at the top level; the payload's fields follow
/// without an `object.` prefix (`user.username`, `tip.tokens`, ...). Enums
/// keep their wire strings, nulls and absent fields are dropped, and array
/// elements are keyed by index.
pub fn flatten_event(event: &Event) -> Result<Record, Error> {
    let mut record = Record::new();
    record.insert("method".into(), FieldValue::Str(event.method.as_str().to_string()));
    record.insert("id".into(), FieldValue::Str(event.id.clone()));

    let object = serde_json::to_value(&event.object)?;
    flatten_into(&mut record, "", object);
    Ok(record)
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn flatten_into(record: &mut Record, prefix: &str, value: Value) {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            record.insert(prefix.to_string(), FieldValue::Bool(b));
        }
        Value::Number(n) => {
            let field = if let Some(i) = n.as_i64() {
                FieldValue::Int(i)
            } else if let Some(f) = n.as_f64() {
                FieldValue::Float(f)
            } else {
                return;
            };
            record.insert(prefix.to_string(), field);
        }
        Value::String(s) => {
            record.insert(prefix.to_string(), FieldValue::Str(s));
        }
        Value::Array(items) => {
            for (idx, item) in items.into_iter().enumerate() {
                flatten_into(record, &join(prefix, &idx.to_string()), item);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                flatten_into(record, &join(prefix, &key), item);
            }
        }
    }
}
