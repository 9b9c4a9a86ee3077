//! [`SqliteStore`], the SQLite implementation of [`RecordStore`].

use std::path::Path;

use cardex_core::{Entity, EntityKind, RecordStore};
use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Result,
  encode::{RawRecord, decode_uuid, encode_body, encode_dt, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A cardex record store backed by a single SQLite file.
///
/// Cloning shares the inner connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::debug!(path = %path.display(), "store opened");
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Close the underlying connection, flushing pending work.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    tracing::debug!("store closed");
    Ok(())
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = crate::Error;

  async fn find<'a, E: Entity>(&'a self, codename: &'a str) -> Result<Option<E>> {
    let kind     = E::KIND.as_str();
    let codename = codename.to_owned();

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT record_id, body_json FROM records WHERE kind = ?1 AND codename = ?2",
              rusqlite::params![kind, codename],
              RawRecord::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRecord::into_entity).transpose()
  }

  async fn find_id<'a>(&'a self, kind: EntityKind, codename: &'a str) -> Result<Option<Uuid>> {
    let kind     = kind.as_str();
    let codename = codename.to_owned();

    let id: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT record_id FROM records WHERE kind = ?1 AND codename = ?2",
              rusqlite::params![kind, codename],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    id.as_deref().map(decode_uuid).transpose()
  }

  async fn save<E: Entity>(&self, mut record: E) -> Result<E> {
    let kind         = E::KIND.as_str();
    let codename     = record.codename().to_owned();
    let body         = encode_body(&record)?;
    let candidate_id = encode_uuid(record.id().unwrap_or_else(Uuid::new_v4));
    let updated_at   = encode_dt(Utc::now());

    // On conflict the existing record_id is kept, so the surface identifier
    // never changes once assigned.
    let stored_id: String = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "INSERT INTO records (record_id, kind, codename, body_json, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (kind, codename) DO UPDATE SET
             body_json  = excluded.body_json,
             updated_at = excluded.updated_at
           RETURNING record_id",
          rusqlite::params![candidate_id, kind, codename, body, updated_at],
          |row| row.get(0),
        )?)
      })
      .await?;

    record.set_id(decode_uuid(&stored_id)?);
    Ok(record)
  }

  async fn list<E: Entity>(&self) -> Result<Vec<E>> {
    let kind = E::KIND.as_str();

    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT record_id, body_json FROM records WHERE kind = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![kind], RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_entity).collect()
  }

  async fn count(&self, kind: EntityKind) -> Result<usize> {
    let kind = kind.as_str();

    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM records WHERE kind = ?1",
          rusqlite::params![kind],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(n as usize)
  }
}
