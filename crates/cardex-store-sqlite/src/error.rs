//! Error type for `cardex-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A stored body did not decode as a JSON object.
  #[error("corrupt {kind} record {codename:?}")]
  CorruptRecord { kind: String, codename: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
