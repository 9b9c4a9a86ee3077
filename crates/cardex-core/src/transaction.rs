//! [`Transaction`], the declarative description of one migration step.
//!
//! A transaction names the oracle and locale sources for one entity kind, the
//! key fields used to index and join them, and two ordered lists of
//! `source → field` copy instructions. The extractor interprets it; there is
//! no per-entity extraction code.
//!
//! Descriptors are read through the `config` crate, so TOML, JSON and YAML
//! files all work (format chosen by extension):
//!
//! ```toml
//! name        = "sides"
//! entity      = "side"
//! oracle_file = "data/oracle/v2/sides.json"
//! locale_file = "data/locale/sides.zh-hans.json"
//!
//! [[oracle_fields]]
//! source = "name"
//! field  = "oracle_name"
//!
//! [[locale_fields]]
//! source = "name"
//! field  = "locale_name"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{EntityKind, Error, Result};

/// One copy instruction: read `source` from a source record, write it to the
/// destination record's `field`.
///
/// `source` may be a dotted path into nested objects (`subtypes.banned`). In a
/// nested transaction, a leading `../` reads from the parent record instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
  pub source: String,
  pub field:  String,
}

/// A best-effort link from a raw codename field to a stored parent record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
  /// Destination field holding the parent's codename (e.g. `side_codename`).
  pub field:    String,
  /// Kind of the parent record.
  pub entity:   EntityKind,
  /// Destination field receiving the resolved [`crate::Relation`].
  pub relation: String,
}

/// How a transaction treats its sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
  /// Create or update one record per oracle entry and overlay locale fields.
  #[default]
  Merge,
  /// Apply locale fields to records that already exist; never create.
  Overlay,
}

/// Appends the text of each entry of a faces array to a text field.
///
/// Each face with non-empty text adds `"\n<prefix><title>\n<text>"`, where
/// the prefix marks a flip card's back or another side, and a face without
/// its own title takes the record's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faces {
  /// Oracle array holding the faces.
  #[serde(default = "default_faces_source")]
  pub source:      String,
  /// Destination text field the faces are appended to.
  pub field:       String,
  /// Title field, read from each face and from the record as a fallback.
  #[serde(default = "default_face_title")]
  pub title:       String,
  /// Text field of each face.
  #[serde(default = "default_face_text")]
  pub text:        String,
  /// Oracle field naming the card layout.
  #[serde(default = "default_face_layout")]
  pub layout:      String,
  /// Layout value whose extra face is the back of the card.
  #[serde(default = "default_flip_layout")]
  pub flip_layout: String,
  /// Destination field receiving the number of faces.
  #[serde(default)]
  pub count:       Option<String>,
}

fn default_faces_source() -> String { "faces".into() }

fn default_face_title() -> String { "title".into() }

fn default_face_text() -> String { "text".into() }

fn default_face_layout() -> String { "layout_id".into() }

fn default_flip_layout() -> String { "flip".into() }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
  pub name:          String,
  pub entity:        EntityKind,
  #[serde(default)]
  pub mode:          Mode,
  /// Unused in overlay mode.
  #[serde(default)]
  pub oracle_file:   PathBuf,
  /// Optional in merge mode: without one, locale fields keep their defaults.
  #[serde(default)]
  pub locale_file:   PathBuf,
  /// Natural-key field of oracle records.
  #[serde(default = "default_oracle_id")]
  pub oracle_id:     String,
  /// Natural-key field of locale records; the locale table is indexed by it.
  #[serde(default = "default_locale_id")]
  pub locale_id:     String,
  /// Oracle field whose normalised value selects the locale record.
  #[serde(default = "default_link_id")]
  pub link_id:       String,
  #[serde(default)]
  pub oracle_fields: Vec<FieldMapping>,
  #[serde(default)]
  pub locale_fields: Vec<FieldMapping>,
  /// Extract the elements of this array field of each oracle record rather
  /// than the oracle records themselves.
  #[serde(default)]
  pub nested:        Option<String>,
  #[serde(default)]
  pub references:    Vec<Reference>,
  #[serde(default)]
  pub faces:         Option<Faces>,
  /// Snapshot file name; defaults to `<name>.json`.
  #[serde(default)]
  pub snapshot:      Option<String>,
}

fn default_oracle_id() -> String { "id".into() }

fn default_locale_id() -> String { "code".into() }

fn default_link_id() -> String { "id".into() }

impl Transaction {
  /// Read and validate a descriptor file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let descriptor_error =
      |e: config::ConfigError| Error::Descriptor { path: path.to_path_buf(), reason: e.to_string() };

    let transaction: Self = config::Config::builder()
      .add_source(config::File::from(path))
      .build()
      .map_err(descriptor_error)?
      .try_deserialize()
      .map_err(descriptor_error)?;

    transaction
      .validate()
      .map_err(|reason| Error::Descriptor { path: path.to_path_buf(), reason })?;
    Ok(transaction)
  }

  pub fn validate(&self) -> Result<(), String> {
    if self.name.trim().is_empty() {
      return Err("`name` must not be empty".into());
    }
    for key in [&self.oracle_id, &self.locale_id, &self.link_id] {
      if key.is_empty() {
        return Err("key fields must not be empty".into());
      }
    }
    let mut mappings = self.oracle_fields.iter().chain(&self.locale_fields);
    if let Some(m) = mappings.find(|m| m.source.is_empty() || m.field.is_empty()) {
      return Err(format!("incomplete field mapping {:?} → {:?}", m.source, m.field));
    }
    if self.mode == Mode::Merge && self.oracle_file.as_os_str().is_empty() {
      return Err("`oracle_file` is required in merge mode".into());
    }
    if self.mode == Mode::Overlay && !self.has_locale() {
      return Err("`locale_file` is required in overlay mode".into());
    }
    if let Some(faces) = &self.faces
      && [&faces.source, &faces.field, &faces.title, &faces.text, &faces.layout]
        .iter()
        .any(|f| f.is_empty())
    {
      return Err("`faces` needs non-empty source, field, title, text and layout".into());
    }
    if self.nested.as_deref() == Some("") {
      return Err("`nested` must name a field".into());
    }
    Ok(())
  }

  pub fn has_locale(&self) -> bool { !self.locale_file.as_os_str().is_empty() }

  pub fn snapshot_file(&self) -> String {
    self.snapshot.clone().unwrap_or_else(|| format!("{}.json", self.name))
  }
}

#[cfg(test)]
mod tests {
  use std::fs;

  use tempfile::TempDir;

  use super::*;

  const FACTIONS: &str = r#"
name        = "factions"
entity      = "faction"
oracle_file = "data/oracle/factions.json"
locale_file = "data/locale/factions.json"

[[oracle_fields]]
source = "name"
field  = "oracle_name"

[[oracle_fields]]
source = "side_id"
field  = "side_codename"

[[locale_fields]]
source = "name"
field  = "locale_name"

[[references]]
field    = "side_codename"
entity   = "side"
relation = "side"
"#;

  #[test]
  fn loads_toml_descriptor_with_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("factions.toml");
    fs::write(&path, FACTIONS).unwrap();

    let tx = Transaction::load(&path).unwrap();
    assert_eq!(tx.entity, EntityKind::Faction);
    assert_eq!(tx.mode, Mode::Merge);
    assert_eq!(tx.oracle_id, "id");
    assert_eq!(tx.locale_id, "code");
    assert_eq!(tx.link_id, "id");
    assert_eq!(tx.oracle_fields.len(), 2);
    assert_eq!(tx.oracle_fields[1].field, "side_codename");
    assert_eq!(tx.references[0].entity, EntityKind::Side);
    assert_eq!(tx.snapshot_file(), "factions.json");
  }

  #[test]
  fn loads_json_descriptor() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cards.json");
    fs::write(
      &path,
      r#"{
        "name": "cards-locale",
        "entity": "card",
        "mode": "overlay",
        "oracle_file": "data/oracle/cards",
        "locale_file": "data/locale/cards.csv",
        "locale_id": "id",
        "locale_fields": [{ "source": "name", "field": "locale_title" }],
        "snapshot": "cards.json"
      }"#,
    )
    .unwrap();

    let tx = Transaction::load(&path).unwrap();
    assert_eq!(tx.mode, Mode::Overlay);
    assert_eq!(tx.locale_id, "id");
    assert!(tx.oracle_fields.is_empty());
    assert_eq!(tx.snapshot_file(), "cards.json");
  }

  #[test]
  fn rejects_incomplete_mapping() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(
      &path,
      "name = \"sides\"\nentity = \"side\"\noracle_file = \"a\"\nlocale_file = \"b\"\n\n[[oracle_fields]]\nsource = \"name\"\nfield = \"\"\n",
    )
    .unwrap();

    let err = Transaction::load(&path).unwrap_err();
    assert!(matches!(err, Error::Descriptor { .. }));
  }

  #[test]
  fn locale_file_is_optional_only_when_merging() {
    let dir = TempDir::new().unwrap();
    let merge = dir.path().join("pools.toml");
    fs::write(&merge, "name = \"pools\"\nentity = \"pool\"\noracle_file = \"data/pools\"\n").unwrap();
    assert!(!Transaction::load(&merge).unwrap().has_locale());

    let overlay = dir.path().join("overlay.toml");
    fs::write(&overlay, "name = \"sides\"\nentity = \"side\"\nmode = \"overlay\"\n").unwrap();
    assert!(matches!(Transaction::load(&overlay).unwrap_err(), Error::Descriptor { .. }));
  }

  #[test]
  fn missing_descriptor_is_an_error() {
    let dir = TempDir::new().unwrap();
    assert!(Transaction::load(dir.path().join("absent.toml")).is_err());
  }
}
