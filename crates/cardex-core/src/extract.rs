//! The generic extractor.
//!
//! A single routine, driven by a [`Transaction`], populates any [`Entity`]
//! type: records are opened as JSON objects, fields are copied onto them by
//! name, and the result is deserialised back into the typed record before it
//! is upserted. Adding an entity kind needs a record struct and a descriptor,
//! never new extraction code.

use std::marker::PhantomData;

use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Error, Result,
  entity::{CODENAME_FIELD, Entity, Relation},
  store::RecordStore,
  table::{Table, key_text},
  transaction::{Faces, FieldMapping, Mode, Reference, Transaction},
};

const BACK_PREFIX: &str = "<strong>Back:</strong> ";
const SIDE_PREFIX: &str = "<strong>Side:</strong> ";

/// Normalise an oracle link key to the locale key convention.
///
/// Oracle keys separate words with `_`, locale keys with `-`. Only the
/// first underscore is replaced: `"a_b_c"` becomes `"a-b_c"`. Multi-word keys
/// therefore only join when the locale data uses the same half-converted
/// form.
pub fn join_key(link: &str) -> String { link.replacen('_', "-", 1) }

// ─── Sources ─────────────────────────────────────────────────────────────────

/// A source record, plus its parent when extracting nested records.
#[derive(Debug, Clone, Copy)]
pub struct Source<'a> {
  record: &'a Value,
  parent: Option<&'a Value>,
}

impl<'a> Source<'a> {
  pub fn new(record: &'a Value) -> Self { Self { record, parent: None } }

  pub fn nested(record: &'a Value, parent: &'a Value) -> Self {
    Self { record, parent: Some(parent) }
  }

  /// Resolve a mapping source path: `name`, `subtypes.banned`, or `../id`.
  pub fn get(&self, path: &str) -> Option<&'a Value> {
    let (root, path) = match path.strip_prefix("../") {
      Some(rest) => (self.parent?, rest),
      None => (self.record, path),
    };
    if let Some(value) = root.get(path) {
      return Some(value);
    }
    path.split('.').try_fold(root, |value, segment| value.get(segment))
  }
}

fn oracle_sources<'a>(oracle: &'a Table, nested: Option<&str>) -> Vec<Source<'a>> {
  match nested {
    None => oracle.records().iter().map(Source::new).collect(),
    Some(field) => oracle
      .records()
      .iter()
      .flat_map(|parent| {
        parent
          .get(field)
          .and_then(Value::as_array)
          .into_iter()
          .flatten()
          .map(move |child| Source::nested(child, parent))
      })
      .collect(),
  }
}

/// The locale table of `tx`, indexed by its locale key; empty when the
/// transaction has no locale source.
fn locale_table(tx: &Transaction) -> Result<Table> {
  if !tx.has_locale() {
    return Ok(Table::default());
  }
  Table::load(&tx.locale_file, Some(&tx.locale_id))
}

// ─── Drafts ──────────────────────────────────────────────────────────────────

/// A destination record opened as a JSON object so fields can be set by name.
struct Draft<'d, E> {
  fields:   Map<String, Value>,
  defaults: &'d Map<String, Value>,
  codename: String,
  _entity:  PhantomData<E>,
}

/// The serialised form of `E::default()`: the set of writable fields and the
/// value each one falls back to.
fn defaults_of<E: Entity>() -> Result<Map<String, Value>> {
  match serde_json::to_value(E::default())? {
    Value::Object(map) => Ok(map),
    _ => Ok(Map::new()),
  }
}

impl<'d, E: Entity> Draft<'d, E> {
  fn open(record: &E, defaults: &'d Map<String, Value>, codename: &str) -> Result<Self> {
    let fields = match serde_json::to_value(record)? {
      Value::Object(map) => map,
      _ => Map::new(),
    };
    Ok(Self { fields, defaults, codename: codename.to_owned(), _entity: PhantomData })
  }

  /// Write `value` verbatim into `field`; a missing or `null` value writes the
  /// field's default instead.
  fn set(&mut self, field: &str, value: Option<&Value>) -> Result<()> {
    let default = self.defaults.get(field).ok_or_else(|| Error::UnknownField {
      kind:  E::KIND,
      field: field.to_owned(),
    })?;
    let value = match value {
      Some(v) if !v.is_null() => v.clone(),
      _ => default.clone(),
    };
    self.fields.insert(field.to_owned(), value);
    Ok(())
  }

  fn apply(&mut self, mappings: &[FieldMapping], source: &Source<'_>) -> Result<()> {
    for mapping in mappings {
      self.set(&mapping.field, source.get(&mapping.source))?;
    }
    Ok(())
  }

  /// Append every face's title and text to `faces.field`, and record the
  /// face count in `faces.count` when configured.
  fn compose_faces(&mut self, faces: &Faces, source: &Source<'_>) -> Result<()> {
    let list = source.get(&faces.source).and_then(Value::as_array);
    let prefix = match source.get(&faces.layout).and_then(Value::as_str) {
      Some(layout) if layout == faces.flip_layout => BACK_PREFIX,
      _ => SIDE_PREFIX,
    };
    let record_title = source.get(&faces.title).and_then(Value::as_str).unwrap_or_default();

    let mut text = self
      .fields
      .get(&faces.field)
      .and_then(Value::as_str)
      .unwrap_or_default()
      .to_owned();
    for face in list.into_iter().flatten() {
      let Some(face_text) = face.get(&faces.text).and_then(Value::as_str).filter(|t| !t.is_empty())
      else {
        continue;
      };
      let title = face.get(&faces.title).and_then(Value::as_str).unwrap_or(record_title);
      text.push_str(&format!("\n{prefix}{title}\n{face_text}"));
    }
    self.set(&faces.field, Some(&Value::String(text)))?;

    if let Some(count) = &faces.count {
      let n = list.map_or(0, Vec::len);
      self.set(count, Some(&Value::from(n)))?;
    }
    Ok(())
  }

  fn set_relation(&mut self, field: &str, relation: Option<Relation>) -> Result<()> {
    match relation {
      Some(r) => {
        self.fields.insert(field.to_owned(), serde_json::to_value(r)?);
      }
      None => {
        self.fields.remove(field);
      }
    }
    Ok(())
  }

  fn finish(self) -> Result<E> {
    serde_json::from_value(Value::Object(self.fields)).map_err(|source| Error::Mapping {
      kind: E::KIND,
      codename: self.codename,
      source,
    })
  }
}

/// Resolve each reference's raw codename to a stored parent. Dangling keys
/// clear the relation and are otherwise ignored.
async fn resolve_references<E, S>(
  store:      &S,
  draft:      &mut Draft<'_, E>,
  references: &[Reference],
) -> Result<()>
where
  E: Entity,
  S: RecordStore,
{
  for reference in references {
    let key = draft.fields.get(&reference.field).and_then(key_text).unwrap_or_default();

    let found = if key.is_empty() {
      None
    } else {
      store.find_id(reference.entity, &key).await.map_err(Error::store)?
    };

    if found.is_none() && !key.is_empty() {
      debug!(
        kind = %E::KIND,
        codename = %draft.codename,
        parent = %reference.entity,
        key = %key,
        "dangling reference"
      );
    }

    draft.set_relation(&reference.relation, found.map(|record_id| Relation { record_id }))?;
  }
  Ok(())
}

fn check_transaction<E: Entity>(tx: &Transaction) -> Result<Map<String, Value>> {
  if tx.entity != E::KIND {
    return Err(Error::KindMismatch {
      transaction: tx.name.clone(),
      declared:    tx.entity,
      requested:   E::KIND,
    });
  }

  let defaults = defaults_of::<E>()?;

  let copies_key = |m: &FieldMapping| m.field == CODENAME_FIELD;
  if let Some(m) = tx
    .oracle_fields
    .iter()
    .filter(|m| copies_key(*m) && m.source != tx.oracle_id)
    .chain(tx.locale_fields.iter().filter(|m| copies_key(*m)))
    .next()
  {
    return Err(Error::NaturalKey {
      transaction:  tx.name.clone(),
      source_field: m.source.clone(),
    });
  }

  let face_fields = tx
    .faces
    .iter()
    .flat_map(|f| std::iter::once(&f.field).chain(f.count.as_ref()));
  let fields = tx
    .oracle_fields
    .iter()
    .chain(&tx.locale_fields)
    .map(|m| &m.field)
    .chain(tx.references.iter().map(|r| &r.field))
    .chain(face_fields);
  for field in fields {
    if !defaults.contains_key(field) {
      return Err(Error::UnknownField { kind: E::KIND, field: field.clone() });
    }
  }

  // Relation fields are skipped while unset, so they are not in `defaults`.
  // Check each one by deserialising a record with the relation filled in.
  let placeholder = serde_json::to_value(Relation { record_id: Uuid::nil() })?;
  for reference in &tx.references {
    let mut trial = defaults.clone();
    trial.insert(reference.relation.clone(), placeholder.clone());
    if serde_json::from_value::<E>(Value::Object(trial)).is_err() {
      return Err(Error::UnknownField { kind: E::KIND, field: reference.relation.clone() });
    }
  }
  Ok(defaults)
}

// ─── Operations ──────────────────────────────────────────────────────────────

/// Run a transaction according to its [`Mode`].
pub async fn run<E, S>(store: &S, tx: &Transaction) -> Result<Vec<E>>
where
  E: Entity,
  S: RecordStore,
{
  match tx.mode {
    Mode::Merge => extract(store, tx).await,
    Mode::Overlay => overlay(store, tx).await,
  }
}

/// Merge oracle and locale sources into records of type `E`.
///
/// For every oracle record, the stored record with the same natural key is
/// updated in place, or a new one is started from `E::default()`. Oracle
/// fields are copied, the locale record is joined through [`join_key`] and
/// its fields copied, references are resolved, and the record is upserted.
/// Records are returned in oracle order.
pub async fn extract<E, S>(store: &S, tx: &Transaction) -> Result<Vec<E>>
where
  E: Entity,
  S: RecordStore,
{
  let defaults = check_transaction::<E>(tx)?;
  let oracle = Table::load(&tx.oracle_file, None)?;
  let locale = locale_table(tx)?;

  let sources = oracle_sources(&oracle, tx.nested.as_deref());
  let mut records = Vec::with_capacity(sources.len());
  let mut localized = 0usize;

  for (index, source) in sources.iter().enumerate() {
    let codename = source
      .get(&tx.oracle_id)
      .and_then(key_text)
      .filter(|k| !k.is_empty())
      .ok_or_else(|| Error::MissingKey {
        transaction: tx.name.clone(),
        index,
        field: tx.oracle_id.clone(),
      })?;

    let existing = store.find::<E>(&codename).await.map_err(Error::store)?;
    let record = existing.unwrap_or_default();

    let mut draft = Draft::<E>::open(&record, &defaults, &codename)?;
    draft.set(CODENAME_FIELD, Some(&Value::String(codename.clone())))?;
    draft.apply(&tx.oracle_fields, source)?;
    if let Some(faces) = &tx.faces {
      draft.compose_faces(faces, source)?;
    }

    let link = source.get(&tx.link_id).and_then(key_text);
    match link.as_deref().map(join_key).and_then(|key| locale.get(&key)) {
      Some(translation) => {
        draft.apply(&tx.locale_fields, &Source::new(translation))?;
        localized += 1;
      }
      None => debug!(kind = %E::KIND, codename = %codename, "no locale record"),
    }

    resolve_references(store, &mut draft, &tx.references).await?;

    let saved = store.save(draft.finish()?).await.map_err(Error::store)?;
    records.push(saved);
  }

  info!(
    transaction = %tx.name,
    records = records.len(),
    localized,
    "extracted"
  );
  Ok(records)
}

/// Apply locale fields to records that already exist.
///
/// Each locale record is matched by its own key, verbatim, against stored
/// natural keys. Locale records with no stored counterpart are skipped.
pub async fn overlay<E, S>(store: &S, tx: &Transaction) -> Result<Vec<E>>
where
  E: Entity,
  S: RecordStore,
{
  let defaults = check_transaction::<E>(tx)?;
  let locale = Table::load(&tx.locale_file, Some(&tx.locale_id))?;

  let mut records = Vec::new();
  let mut skipped = 0usize;

  for row in locale.records() {
    let Some(codename) = row.get(&tx.locale_id).and_then(key_text) else {
      skipped += 1;
      continue;
    };
    let Some(existing) = store.find::<E>(&codename).await.map_err(Error::store)? else {
      debug!(kind = %E::KIND, codename = %codename, "no stored record for locale row");
      skipped += 1;
      continue;
    };

    let mut draft = Draft::<E>::open(&existing, &defaults, &codename)?;
    draft.apply(&tx.locale_fields, &Source::new(row))?;

    let saved = store.save(draft.finish()?).await.map_err(Error::store)?;
    records.push(saved);
  }

  info!(
    transaction = %tx.name,
    records = records.len(),
    skipped,
    "overlaid"
  );
  Ok(records)
}

// ─── Dry run ─────────────────────────────────────────────────────────────────

/// Counts describing how a transaction's sources line up, without writing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Survey {
  pub oracle:   usize,
  pub locale:   usize,
  /// Oracle records whose normalised link key finds a locale record.
  pub matched:  usize,
  /// Oracle records lacking a usable natural key.
  pub keyless:  usize,
}

/// Load a transaction's sources and report how they join.
pub fn survey(tx: &Transaction) -> Result<Survey> {
  let locale = locale_table(tx)?;

  if tx.mode == Mode::Overlay {
    return Ok(Survey { locale: locale.len(), ..Survey::default() });
  }

  let oracle = Table::load(&tx.oracle_file, None)?;
  let sources = oracle_sources(&oracle, tx.nested.as_deref());

  let mut survey = Survey { oracle: sources.len(), locale: locale.len(), ..Survey::default() };
  for source in &sources {
    if source.get(&tx.oracle_id).and_then(key_text).is_none_or(|k| k.is_empty()) {
      survey.keyless += 1;
    }
    let link = source.get(&tx.link_id).and_then(key_text);
    if link.is_some_and(|k| locale.get(&join_key(&k)).is_some()) {
      survey.matched += 1;
    }
  }
  Ok(survey)
}
