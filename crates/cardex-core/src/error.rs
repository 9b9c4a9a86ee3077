//! Error types for `cardex-core`.

use std::path::PathBuf;

use thiserror::Error;

use crate::entity::EntityKind;

#[derive(Debug, Error)]
pub enum Error {
  #[error("cannot read {path:?}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("malformed JSON in {path:?}: {source}")]
  Json {
    path:   PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("malformed CSV in {path:?}: {source}")]
  Csv {
    path:   PathBuf,
    #[source]
    source: csv::Error,
  },

  #[error("{path:?} contains a record that is not a JSON object")]
  NotAnObject { path: PathBuf },

  #[error("invalid transaction descriptor {path:?}: {reason}")]
  Descriptor { path: PathBuf, reason: String },

  #[error("transaction {transaction:?}: oracle record #{index} has no usable {field:?} key")]
  MissingKey {
    transaction: String,
    index:       usize,
    field:       String,
  },

  #[error("transaction {transaction:?} declares {declared} records but was run for {requested}")]
  KindMismatch {
    transaction: String,
    declared:    EntityKind,
    requested:   EntityKind,
  },

  #[error("transaction {transaction:?}: `codename` can only be copied from the oracle key, not {source_field:?}")]
  NaturalKey {
    transaction:  String,
    source_field: String,
  },

  #[error("{kind} has no field named {field:?}")]
  UnknownField { kind: EntityKind, field: String },

  #[error("{kind} {codename:?}: {source}")]
  Mapping {
    kind:     EntityKind,
    codename: String,
    #[source]
    source:   serde_json::Error,
  },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error raised through [`crate::RecordStore`].
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
