//! References to documents that may or may not be populated.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A reference to another backend document.
///
/// Depending on the endpoint, the backend either returns the referenced
/// document's ID or the populated document itself. Both shapes decode into
/// this type. Decoding never fails: a populated document that does not match
/// `T` keeps only its `_id`, and `null` (a deleted document) or an
/// unrecognised shape becomes [`Ref::Missing`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Ref<T> {
    /// Only the identifier was returned.
    Id(String),
    /// The referenced document was populated inline.
    Populated(Box<T>),
    /// The reference was null, absent or unreadable.
    Missing,
}

impl<T> Default for Ref<T> {
    fn default() -> Self {
        Self::Missing
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Ref<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(id) => Self::Id(id),
            Value::Object(fields) => {
                let id = ["_id", "id"]
                    .iter()
                    .find_map(|key| fields.get(*key).and_then(Value::as_str))
                    .map(str::to_string);
                match (serde_json::from_value::<T>(Value::Object(fields)), id) {
                    (Ok(doc), _) => Self::Populated(Box::new(doc)),
                    (Err(_), Some(id)) => Self::Id(id),
                    (Err(_), None) => Self::Missing,
                }
            }
            _ => Self::Missing,
        })
    }
}

impl<T> Ref<T> {
    /// The populated document, if present.
    #[must_use]
    pub fn populated(&self) -> Option<&T> {
        match self {
            Self::Populated(doc) => Some(doc),
            Self::Id(_) | Self::Missing => None,
        }
    }

    /// Returns `true` if only the ID is known.
    #[must_use]
    pub const fn is_id_only(&self) -> bool {
        matches!(self, Self::Id(_))
    }

    /// Returns `true` if the referenced document is gone or unreadable.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// Documents that expose their backend identifier.
pub trait Identified {
    /// Raw backend identifier.
    fn raw_id(&self) -> &str;
}

impl<T: Identified> Ref<T> {
    /// The referenced document's ID, whichever shape was returned.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Id(id) => Some(id),
            Self::Populated(doc) => Some(doc.raw_id()),
            Self::Missing => None,
        }
    }
}
