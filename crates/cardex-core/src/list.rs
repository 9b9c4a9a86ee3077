//! [`CodenameList`]: a multi-valued reference stored as one delimited string.
//!
//! Card pools, ban lists and card subtypes reference many other records. They
//! are stored denormalised: the member codenames joined by a fixed separator.
//! The separator never leaves this module; callers see an ordered list.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const SEPARATOR: &str = ",";

/// Field-name suffix shared by every [`CodenameList`] field.
pub const LIST_SUFFIX: &str = "_list";

/// An ordered list of codenames persisted as a single delimited string.
///
/// Serialises to the encoded string. Deserialises from the encoded string,
/// from a JSON array of strings (as found in oracle data), or from `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodenameList(Vec<String>);

impl CodenameList {
  pub fn new(members: Vec<String>) -> Self { Self(members) }

  /// Split an encoded string back into members. `""` is the empty list.
  pub fn decode(encoded: &str) -> Self {
    if encoded.is_empty() {
      return Self::default();
    }
    Self(encoded.split(SEPARATOR).map(str::to_owned).collect())
  }

  pub fn encode(&self) -> String { self.0.join(SEPARATOR) }

  pub fn codenames(&self) -> &[String] { &self.0 }

  pub fn iter(&self) -> impl Iterator<Item = &str> { self.0.iter().map(String::as_str) }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn contains(&self, codename: &str) -> bool { self.iter().any(|c| c == codename) }
}

impl From<Vec<String>> for CodenameList {
  fn from(members: Vec<String>) -> Self { Self(members) }
}

impl fmt::Display for CodenameList {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.encode()) }
}

impl Serialize for CodenameList {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.encode())
  }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Repr {
  Encoded(String),
  Members(Vec<String>),
}

impl<'de> Deserialize<'de> for CodenameList {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    Ok(match Option::<Repr>::deserialize(deserializer)? {
      Some(Repr::Encoded(s)) => Self::decode(&s),
      Some(Repr::Members(members)) => Self(members),
      None => Self::default(),
    })
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn empty_list_encodes_to_empty_string() {
    let list = CodenameList::default();
    assert_eq!(list.encode(), "");
    assert!(CodenameList::decode("").is_empty());
  }

  #[test]
  fn members_keep_their_order() {
    let list = CodenameList::new(vec!["x".into(), "y".into(), "z".into()]);
    let back = CodenameList::decode(&list.encode());
    assert_eq!(back.codenames(), ["x", "y", "z"]);
    assert!(back.contains("y"));
  }

  #[test]
  fn deserialises_from_array_string_and_null() {
    let from_array: CodenameList = serde_json::from_value(json!(["a", "b"])).unwrap();
    assert_eq!(from_array.codenames(), ["a", "b"]);

    let from_string: CodenameList =
      serde_json::from_value(json!(from_array.encode())).unwrap();
    assert_eq!(from_string, from_array);

    let from_null: CodenameList = serde_json::from_value(json!(null)).unwrap();
    assert!(from_null.is_empty());
  }

  #[test]
  fn serialises_as_encoded_string() {
    let list = CodenameList::new(vec!["core".into(), "midnight_sun".into()]);
    assert_eq!(serde_json::to_value(&list).unwrap(), json!(list.encode()));
  }
}
