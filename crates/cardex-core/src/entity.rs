//! The [`Entity`] trait and the closed set of entity kinds.
//!
//! Every record has a store-generated surface identifier (`id`) and a natural
//! key (`codename`). Only the codename identifies a record across runs;
//! cross-entity references are stored as codenames and optionally resolved
//! into a [`Relation`].

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

/// Name of the surface-identifier attribute on every record.
pub const ID_FIELD: &str = "id";

/// Name of the natural-key attribute on every record.
pub const CODENAME_FIELD: &str = "codename";

// ─── Kinds ───────────────────────────────────────────────────────────────────

/// The entity types handled by the pipeline.
///
/// Variants are declared in dependency order: a kind only references kinds
/// declared before it, so iterating in declaration order lets every
/// cross-entity lookup resolve against already-persisted parents.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
  Side,
  Faction,
  Type,
  Subtype,
  Settype,
  Cycle,
  Set,
  Format,
  Pool,
  Restriction,
  Snapshot,
  Card,
  Printing,
  Ruling,
}

impl EntityKind {
  /// Storage discriminant, e.g. `"settype"`.
  pub fn as_str(self) -> &'static str { self.into() }

  /// Default snapshot file name, e.g. `"factions.json"`.
  pub fn snapshot_file(self) -> String { format!("{self}s.json") }
}

// ─── Relations ───────────────────────────────────────────────────────────────

/// A resolved link to another stored record.
///
/// Sits next to the raw `*_codename` field it was resolved from. Left unset
/// when the referenced codename has no stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
  pub record_id: Uuid,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// A record type the extractor can populate and a store can persist.
///
/// `Default` is the record factory: the extractor starts every new record from
/// `Self::default()` and copies mapped fields onto it by name through serde.
/// Field names in transaction descriptors are therefore the serialised field
/// names of the implementing struct.
pub trait Entity:
  Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static
{
  const KIND: EntityKind;

  /// Store-generated surface identifier; `None` until first saved.
  fn id(&self) -> Option<Uuid>;

  fn set_id(&mut self, id: Uuid);

  /// The natural key.
  fn codename(&self) -> &str;
}

/// Implement [`Entity`] for a record struct with `id` and `codename` fields.
macro_rules! impl_entity {
  ($($ty:ty => $kind:ident),* $(,)?) => {
    $(
      impl $crate::entity::Entity for $ty {
        const KIND: $crate::entity::EntityKind = $crate::entity::EntityKind::$kind;

        fn id(&self) -> Option<::uuid::Uuid> { self.id }

        fn set_id(&mut self, id: ::uuid::Uuid) { self.id = Some(id); }

        fn codename(&self) -> &str { &self.codename }
      }
    )*
  };
}

pub(crate) use impl_entity;

/// Evaluate `$body` with `$E` bound to the record type for a runtime
/// [`EntityKind`].
///
/// ```rust,ignore
/// let n = with_entity!(kind, E => store.list::<E>().await?.len());
/// ```
#[macro_export]
macro_rules! with_entity {
  ($kind:expr, $E:ident => $body:expr) => {{
    use $crate::{entity::EntityKind as __Kind, records as __r};
    match $kind {
      __Kind::Side => { type $E = __r::Side; $body }
      __Kind::Faction => { type $E = __r::Faction; $body }
      __Kind::Type => { type $E = __r::CardType; $body }
      __Kind::Subtype => { type $E = __r::Subtype; $body }
      __Kind::Settype => { type $E = __r::Settype; $body }
      __Kind::Cycle => { type $E = __r::Cycle; $body }
      __Kind::Set => { type $E = __r::CardSet; $body }
      __Kind::Format => { type $E = __r::Format; $body }
      __Kind::Pool => { type $E = __r::Pool; $body }
      __Kind::Restriction => { type $E = __r::Restriction; $body }
      __Kind::Snapshot => { type $E = __r::Snapshot; $body }
      __Kind::Card => { type $E = __r::Card; $body }
      __Kind::Printing => { type $E = __r::Printing; $body }
      __Kind::Ruling => { type $E = __r::Ruling; $body }
    }
  }};
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use strum::IntoEnumIterator;

  use super::*;

  #[test]
  fn kinds_round_trip_through_their_names() {
    for kind in EntityKind::iter() {
      assert_eq!(EntityKind::from_str(kind.as_str()).unwrap(), kind);
    }
  }

  #[test]
  fn snapshot_file_names() {
    assert_eq!(EntityKind::Side.snapshot_file(), "sides.json");
    assert_eq!(EntityKind::Restriction.snapshot_file(), "restrictions.json");
  }

  #[test]
  fn declaration_order_puts_parents_first() {
    let order: Vec<_> = EntityKind::iter().collect();
    let pos = |k| order.iter().position(|o| *o == k).unwrap();
    assert!(pos(EntityKind::Side) < pos(EntityKind::Faction));
    assert!(pos(EntityKind::Faction) < pos(EntityKind::Card));
    assert!(pos(EntityKind::Format) < pos(EntityKind::Snapshot));
    assert!(pos(EntityKind::Card) < pos(EntityKind::Ruling));
  }
}
