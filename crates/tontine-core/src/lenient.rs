//! Forgiving deserialisers for numeric fields.
//!
//! Older records and hand-written request bodies carry amounts as numbers, as
//! numeric strings, or not at all. Anything that is not a usable non-negative
//! number reads as zero.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn coerce(value: &Value) -> f64 {
  let n = match value {
    Value::Number(n) => n.as_f64().unwrap_or(0.0),
    Value::String(s) => s.trim().parse().unwrap_or(0.0),
    Value::Bool(_) | Value::Null | Value::Array(_) | Value::Object(_) => 0.0,
  };
  if n.is_finite() && n > 0.0 { n } else { 0.0 }
}

fn to_count(n: f64) -> u32 {
  // `coerce` guarantees a finite, non-negative value; `as` saturates.
  n.trunc() as u32
}

pub fn amount<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
  Ok(coerce(&Value::deserialize(d)?))
}

pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
  Ok(to_count(coerce(&Value::deserialize(d)?)))
}

pub fn opt_amount<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
  Ok(Option::<Value>::deserialize(d)?.map(|v| coerce(&v)))
}

pub fn opt_count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
  Ok(Option::<Value>::deserialize(d)?.map(|v| to_count(coerce(&v))))
}
