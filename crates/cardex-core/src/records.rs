//! Record structs, one per [`EntityKind`](crate::EntityKind).
//!
//! Oracle-derived fields are prefixed `oracle_`, locale overlays `locale_`.
//! Locale overlays stay `""` until a matching locale record is found.
//! Cross-entity references are kept as raw `*_codename` strings; the resolved
//! [`Relation`] beside them is only set when the parent exists in the store.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{entity::{Relation, impl_entity}, list::CodenameList};

// ─── Game structure ──────────────────────────────────────────────────────────

/// One of the two sides of the game (corp / runner).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Side {
  pub id:          Option<Uuid>,
  pub codename:    String,
  pub oracle_name: String,
  pub locale_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Faction {
  pub id:            Option<Uuid>,
  pub codename:      String,
  pub oracle_name:   String,
  pub locale_name:   String,
  pub oracle_desc:   String,
  pub locale_desc:   String,
  pub color:         String,
  pub is_mini:       bool,
  pub side_codename: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub side:          Option<Relation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CardType {
  pub id:            Option<Uuid>,
  pub codename:      String,
  pub oracle_name:   String,
  pub locale_name:   String,
  pub side_codename: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub side:          Option<Relation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Subtype {
  pub id:          Option<Uuid>,
  pub codename:    String,
  pub oracle_name: String,
  pub locale_name: String,
}

// ─── Releases ────────────────────────────────────────────────────────────────

/// The kind of a product release (core set, data pack, expansion, …).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settype {
  pub id:          Option<Uuid>,
  pub codename:    String,
  pub oracle_name: String,
  pub locale_name: String,
  pub oracle_desc: String,
  pub locale_desc: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Cycle {
  pub id:              Option<Uuid>,
  pub codename:        String,
  pub oracle_name:     String,
  pub locale_name:     String,
  pub legacy_codename: String,
  pub position:        i64,
  pub released_by:     String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CardSet {
  pub id:               Option<Uuid>,
  pub codename:         String,
  pub oracle_name:      String,
  pub locale_name:      String,
  pub legacy_codename:  String,
  pub cycle_codename:   String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub cycle:            Option<Relation>,
  pub settype_codename: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub settype:          Option<Relation>,
  pub release_date:     String,
  pub position:         i64,
  pub size:             i64,
  pub released_by:      String,
}

// ─── Organised play ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Format {
  pub id:          Option<Uuid>,
  pub codename:    String,
  pub oracle_name: String,
  pub locale_name: String,
}

/// The cycles and sets legal in a format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Pool {
  pub id:                  Option<Uuid>,
  pub codename:            String,
  pub oracle_name:         String,
  pub format_codename:     String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub format:              Option<Relation>,
  pub cycle_codename_list: CodenameList,
  pub set_codename_list:   CodenameList,
}

/// A ban list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Restriction {
  pub id:                           Option<Uuid>,
  pub codename:                     String,
  pub oracle_name:                  String,
  pub format_codename:              String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub format:                       Option<Relation>,
  pub start_date:                   String,
  pub banned_card_codename_list:    CodenameList,
  pub banned_subtype_codename_list: CodenameList,
}

/// A point-in-time pairing of a format with a card pool and a ban list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Snapshot {
  pub id:                   Option<Uuid>,
  pub codename:             String,
  pub format_codename:      String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub format:               Option<Relation>,
  pub pool_codename:        String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub pool:                 Option<Relation>,
  pub restriction_codename: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub restriction:          Option<Relation>,
  pub start_date:           String,
  pub active:               bool,
}

// ─── Cards ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Card {
  pub id:                      Option<Uuid>,
  pub codename:                String,
  pub oracle_title:            String,
  pub locale_title:            String,
  pub stripped_title:          String,
  pub oracle_text:             String,
  pub locale_text:             String,
  pub stripped_text:           String,
  pub type_codename:           String,
  #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
  pub card_type:               Option<Relation>,
  pub subtype_codename_list:   CodenameList,
  pub side_codename:           String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub side:                    Option<Relation>,
  pub faction_codename:        String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub faction:                 Option<Relation>,
  pub is_unique:               bool,
  pub deck_limit:              Option<i64>,
  pub advancement_requirement: Option<i64>,
  pub agenda_point:            Option<i64>,
  pub base_link:               Option<i64>,
  pub minimum_deck_size:       Option<i64>,
  pub influence_limit:         Option<i64>,
  pub influence_cost:          Option<i64>,
  pub cost:                    Option<i64>,
  pub strength:                Option<i64>,
  pub memory_cost:             Option<i64>,
  pub trash_cost:              Option<i64>,
  pub attribution:             String,
  pub designed_by:             String,
  pub pronouns:                String,
  pub pronunciation_ipa:       String,
  pub pronunciation_approx:    String,
  /// Number of faces beyond the front; their text is appended to
  /// `oracle_text`.
  pub extra_face:              i64,
}

/// A card as it appears in one specific set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Printing {
  pub id:            Option<Uuid>,
  pub codename:      String,
  pub card_codename: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub card:          Option<Relation>,
  pub set_codename:  String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub set:           Option<Relation>,
  pub oracle_flavor: String,
  pub locale_flavor: String,
  pub illustrator:   String,
  pub position:      i64,
  pub quantity:      i64,
  pub release_date:  String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Ruling {
  pub id:            Option<Uuid>,
  pub codename:      String,
  pub card_codename: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub card:          Option<Relation>,
  pub oracle_text:   String,
  pub locale_text:   String,
  pub verified:      bool,
  pub updated_at:    String,
}

impl_entity! {
  Side => Side,
  Faction => Faction,
  CardType => Type,
  Subtype => Subtype,
  Settype => Settype,
  Cycle => Cycle,
  CardSet => Set,
  Format => Format,
  Pool => Pool,
  Restriction => Restriction,
  Snapshot => Snapshot,
  Card => Card,
  Printing => Printing,
  Ruling => Ruling,
}
