//! Snapshot writer: exports records as a pretty-printed JSON array.
//!
//! Snapshots carry natural keys only. The surface identifier is dropped, as
//! is every non-scalar attribute (resolved relations), except list fields,
//! which are expanded from their stored encoding back into arrays.

use std::{fs, path::Path};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::{
  Error, Result,
  entity::ID_FIELD,
  list::{CodenameList, LIST_SUFFIX},
};

/// The exported form of a single record.
pub fn to_value<T: Serialize>(record: &T) -> Result<Value> {
  let fields = match serde_json::to_value(record)? {
    Value::Object(map) => map,
    other => return Ok(other),
  };

  let exported: Map<String, Value> = fields
    .into_iter()
    .filter(|(key, _)| key != ID_FIELD)
    .filter_map(|(key, value)| match value {
      Value::String(encoded) if key.ends_with(LIST_SUFFIX) => {
        let members = CodenameList::decode(&encoded)
          .iter()
          .map(|c| Value::String(c.to_owned()))
          .collect();
        Some((key, Value::Array(members)))
      }
      Value::Object(_) | Value::Array(_) => None,
      scalar => Some((key, scalar)),
    })
    .collect();

  Ok(Value::Object(exported))
}

/// Write `records` to `path` as one JSON array with 2-space indentation,
/// replacing any existing file.
pub fn write<T: Serialize>(path: impl AsRef<Path>, records: &[T]) -> Result<()> {
  let path = path.as_ref();
  let io_error = |source| Error::Io { path: path.to_path_buf(), source };

  let document = records.iter().map(to_value).collect::<Result<Vec<_>>>()?;
  let text = serde_json::to_string_pretty(&document)?;

  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent).map_err(io_error)?;
  }
  fs::write(path, text).map_err(io_error)?;

  info!(path = %path.display(), records = records.len(), "snapshot written");
  Ok(())
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use tempfile::TempDir;
  use uuid::Uuid;

  use super::*;
  use crate::{
    Relation,
    records::{CardType, Pool, Side},
  };

  #[test]
  fn strips_surface_identifier() {
    let side = Side {
      id:          Some(Uuid::new_v4()),
      codename:    "runner".into(),
      oracle_name: "Runner".into(),
      locale_name: "Corredor".into(),
    };
    assert_eq!(
      to_value(&side).unwrap(),
      json!({ "codename": "runner", "oracle_name": "Runner", "locale_name": "Corredor" })
    );
  }

  #[test]
  fn drops_relations_but_keeps_raw_keys() {
    let card_type = CardType {
      codename: "ice".into(),
      side_codename: "corp".into(),
      side: Some(Relation { record_id: Uuid::new_v4() }),
      ..CardType::default()
    };
    let value = to_value(&card_type).unwrap();
    assert_eq!(value["side_codename"], "corp");
    assert!(value.get("side").is_none());
  }

  #[test]
  fn expands_list_fields() {
    let pool = Pool {
      codename: "standard_01".into(),
      set_codename_list: CodenameList::new(vec!["x".into(), "y".into(), "z".into()]),
      ..Pool::default()
    };
    let value = to_value(&pool).unwrap();
    assert_eq!(value["set_codename_list"], json!(["x", "y", "z"]));
    assert_eq!(value["cycle_codename_list"], json!([]));
  }

  #[test]
  fn writes_pretty_array_and_overwrites() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out/sides.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "stale").unwrap();

    let sides = vec![Side { codename: "corp".into(), ..Side::default() }];
    write(&path, &sides).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("[\n  {\n    \"codename\": \"corp\""));
    let parsed: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 1);
  }

  #[test]
  fn empty_input_writes_empty_array() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/dir/none.json");
    write::<Side>(&path, &[]).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
  }
}
