//! Encoding and decoding helpers between records and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, UUIDs as hyphenated lowercase
//! strings. Record bodies are compact JSON without the surface identifier,
//! which lives in its own column.

use cardex_core::{Entity, entity::ID_FIELD};
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

// ─── Record bodies ───────────────────────────────────────────────────────────

pub fn encode_body<E: Entity>(record: &E) -> Result<String> {
  let Value::Object(mut fields) = serde_json::to_value(record)? else {
    return Err(Error::CorruptRecord {
      kind:     E::KIND.to_string(),
      codename: record.codename().to_owned(),
    });
  };
  fields.remove(ID_FIELD);
  Ok(Value::Object(fields).to_string())
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `records` row.
pub struct RawRecord {
  pub record_id: String,
  pub body_json: String,
}

impl RawRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { record_id: row.get(0)?, body_json: row.get(1)? })
  }

  pub fn into_entity<E: Entity>(self) -> Result<E> {
    let mut record: E = serde_json::from_str(&self.body_json)?;
    record.set_id(decode_uuid(&self.record_id)?);
    Ok(record)
  }
}
