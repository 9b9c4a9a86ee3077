//! Core types for the cardex card-data migration toolkit.
//!
//! Oracle (English) and locale (translated) reference data are loaded into
//! [`Table`]s, merged by natural key under the direction of a declarative
//! [`Transaction`], upserted through a [`RecordStore`], and exported as JSON
//! snapshots.
//!
//! This crate has no database dependency. Storage backends
//! (e.g. `cardex-store-sqlite`) implement [`RecordStore`].

pub mod entity;
pub mod error;
pub mod extract;
pub mod list;
pub mod records;
pub mod snapshot;
pub mod store;
pub mod table;
pub mod transaction;

pub use entity::{Entity, EntityKind, Relation};
pub use error::{Error, Result};
pub use list::CodenameList;
pub use store::RecordStore;
pub use table::Table;
pub use transaction::{Faces, FieldMapping, Mode, Reference, Transaction};
