//! Encoding helpers between JSON documents and the text stored in SQLite.
//!
//! Documents are stored as compact JSON; timestamps as RFC 3339 strings.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::Result;

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn encode_value(v: &Value) -> Result<String> { Ok(serde_json::to_string(v)?) }

pub fn decode_value(s: &str) -> Result<Value> { Ok(serde_json::from_str(s)?) }
