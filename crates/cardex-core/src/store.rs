//! The `RecordStore` trait, the storage boundary of the pipeline.
//!
//! The extractor needs nothing more than find-by-natural-key and
//! upsert-by-natural-key. Storage backends (e.g. `cardex-store-sqlite`)
//! implement this trait; the pipeline never sees a concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::entity::{Entity, EntityKind};

/// Abstraction over a keyed upsert store.
///
/// Records are identified by `(kind, codename)`. The surface identifier is
/// assigned by the store on first save and is stable only within that store.
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch the record of type `E` with the given natural key.
  fn find<'a, E: Entity>(
    &'a self,
    codename: &'a str,
  ) -> impl Future<Output = Result<Option<E>, Self::Error>> + Send + 'a;

  /// Resolve a natural key of any kind to its surface identifier.
  fn find_id<'a>(
    &'a self,
    kind: EntityKind,
    codename: &'a str,
  ) -> impl Future<Output = Result<Option<Uuid>, Self::Error>> + Send + 'a;

  /// Insert or update `record` by natural key and return it with its surface
  /// identifier set.
  fn save<E: Entity>(
    &self,
    record: E,
  ) -> impl Future<Output = Result<E, Self::Error>> + Send + '_;

  /// All records of type `E`, in first-insertion order.
  fn list<E: Entity>(
    &self,
  ) -> impl Future<Output = Result<Vec<E>, Self::Error>> + Send + '_;

  /// Number of stored records of `kind`.
  fn count(
    &self,
    kind: EntityKind,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}
