//! [`Table`]: a homogeneous set of source records loaded from disk.
//!
//! A table is built from a single file or from a directory tree. Directories
//! are walked recursively in file-name order so that the resulting record
//! order does not depend on the platform. `.json` files hold one object or an
//! array of objects; `.csv` files hold a header row followed by one record per
//! line. Anything else is ignored.

use std::{
  collections::HashMap,
  fs,
  path::{Path, PathBuf},
};

use serde_json::{Map, Value};

use crate::{Error, Result};

/// An ordered list of source records with an optional index by key field.
#[derive(Debug, Clone, Default)]
pub struct Table {
  records: Vec<Value>,
  index:   HashMap<String, usize>,
}

impl Table {
  /// Load every record under `path`. When `key` is given, records are also
  /// indexed by the string value of that field; later records win over
  /// earlier ones with the same key.
  pub fn load(path: impl AsRef<Path>, key: Option<&str>) -> Result<Self> {
    let mut records = Vec::new();
    collect(path.as_ref(), &mut records)?;
    Ok(Self::from_records(records, key))
  }

  pub fn from_records(records: Vec<Value>, key: Option<&str>) -> Self {
    let mut index = HashMap::new();
    if let Some(field) = key {
      for (position, record) in records.iter().enumerate() {
        if let Some(k) = key_of(record, field) {
          index.insert(k, position);
        }
      }
    }
    Self { records, index }
  }

  pub fn records(&self) -> &[Value] { &self.records }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.index.get(key).map(|&i| &self.records[i])
  }

  pub fn len(&self) -> usize { self.records.len() }

  pub fn is_empty(&self) -> bool { self.records.is_empty() }
}

/// The value of `field` as an index key.
pub fn key_of(record: &Value, field: &str) -> Option<String> { key_text(record.get(field)?) }

/// A JSON value as key text. Numbers are keyed by their decimal text; other
/// non-string types are not keys.
pub fn key_text(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

// ─── Loading ─────────────────────────────────────────────────────────────────

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
  move |source| Error::Io { path: path.to_path_buf(), source }
}

fn collect(path: &Path, out: &mut Vec<Value>) -> Result<()> {
  let meta = fs::metadata(path).map_err(io_error(path))?;

  if meta.is_dir() {
    let mut entries: Vec<PathBuf> = fs::read_dir(path)
      .map_err(io_error(path))?
      .map(|entry| entry.map(|e| e.path()))
      .collect::<std::io::Result<_>>()
      .map_err(io_error(path))?;
    entries.sort();

    for entry in entries {
      collect(&entry, out)?;
    }
    return Ok(());
  }

  match path.extension().and_then(|e| e.to_str()) {
    Some("json") => read_json(path, out),
    Some("csv") => read_csv(path, out),
    _ => Ok(()),
  }
}

fn read_json(path: &Path, out: &mut Vec<Value>) -> Result<()> {
  let text = fs::read_to_string(path).map_err(io_error(path))?;
  let content: Value = serde_json::from_str(&text)
    .map_err(|source| Error::Json { path: path.to_path_buf(), source })?;

  let items = match content {
    Value::Array(items) => items,
    other => vec![other],
  };

  for item in items {
    if !item.is_object() {
      return Err(Error::NotAnObject { path: path.to_path_buf() });
    }
    out.push(item);
  }
  Ok(())
}

fn read_csv(path: &Path, out: &mut Vec<Value>) -> Result<()> {
  let csv_error = |source| Error::Csv { path: path.to_path_buf(), source };

  let mut reader = csv::ReaderBuilder::new()
    .has_headers(true)
    .from_path(path)
    .map_err(csv_error)?;
  let headers = reader.headers().map_err(csv_error)?.clone();

  for row in reader.records() {
    let row = row.map_err(csv_error)?;
    let record: Map<String, Value> = headers
      .iter()
      .zip(row.iter())
      .map(|(column, cell)| (column.to_owned(), Value::String(cell.to_owned())))
      .collect();
    out.push(Value::Object(record));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use std::fs;

  use serde_json::json;
  use tempfile::TempDir;

  use super::*;

  fn write(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
  }

  #[test]
  fn loads_array_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "sides.json", r#"[{"id":"corp"},{"id":"runner"}]"#);

    let table = Table::load(dir.path().join("sides.json"), None).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.records()[1]["id"], "runner");
  }

  #[test]
  fn loads_directory_tree_in_sorted_order() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "b/second.json", r#"{"id":"c"}"#);
    write(dir.path(), "a.json", r#"[{"id":"a"},{"id":"b"}]"#);
    write(dir.path(), "b/first.json", r#"{"id":"d"}"#);
    write(dir.path(), "README.md", "not data");

    let table = Table::load(dir.path(), Some("id")).unwrap();
    let ids: Vec<_> = table
      .records()
      .iter()
      .map(|r| r["id"].as_str().unwrap())
      .collect();
    assert_eq!(ids, ["a", "b", "d", "c"]);
    assert!(table.get("d").is_some());
  }

  #[test]
  fn duplicate_keys_keep_the_last_record() {
    let table = Table::from_records(
      vec![
        json!({"code": "hb", "name": "first"}),
        json!({"code": "hb", "name": "second"}),
      ],
      Some("code"),
    );
    assert_eq!(table.len(), 2);
    assert_eq!(table.get("hb").unwrap()["name"], "second");
  }

  #[test]
  fn numeric_keys_are_indexed_as_text() {
    let table = Table::from_records(vec![json!({"id": 42})], Some("id"));
    assert!(table.get("42").is_some());
  }

  #[test]
  fn loads_csv_rows_as_string_records() {
    let dir = TempDir::new().unwrap();
    write(
      dir.path(),
      "factions.csv",
      "id,name,description\nanarch,Anarquista,Caos\n\nshaper,Moldeador,\n",
    );

    let table = Table::load(dir.path().join("factions.csv"), Some("id")).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.get("anarch").unwrap()["name"], "Anarquista");
    assert_eq!(table.get("shaper").unwrap()["description"], "");
  }

  #[test]
  fn missing_path_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = Table::load(dir.path().join("nope.json"), None).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
  }

  #[test]
  fn scalar_entries_are_rejected() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "bad.json", "[1, 2]");
    let err = Table::load(dir.path().join("bad.json"), None).unwrap_err();
    assert!(matches!(err, Error::NotAnObject { .. }));
  }
}
