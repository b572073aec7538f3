use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::domain::DramaId;

/// The only keys a stored record may carry once the maintenance pass has run.
pub const CANONICAL_FIELDS: [&str; 11] = [
    "id",
    "sources",
    "title",
    "type",
    "episodes",
    "status",
    "year",
    "picture",
    "thumbnail",
    "synonyms",
    "tags",
];

/// One title as persisted in the drama database.
///
/// Field declaration order is the on-disk key order. Keys that are not part
/// of the canonical set (left behind by older versions of the file) are kept
/// in `foreign` until [`DramaStore::clean`](crate::db::DramaStore::clean)
/// strips them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DramaRecord {
    pub id: DramaId,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub sources: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub kind: String,
    #[serde(default = "empty_value")]
    pub episodes: Value,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: String,
    #[serde(default = "empty_value")]
    pub year: Value,
    #[serde(default, deserialize_with = "lenient_string")]
    pub picture: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub thumbnail: String,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub synonyms: Vec<String>,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub tags: Vec<Tag>,
    #[serde(flatten)]
    pub foreign: Map<String, Value>,
}

fn empty_value() -> Value {
    Value::String(String::new())
}

// Older writers stored whatever the catalog sent, so `null` (or a number)
// can sit where a string or list belongs. Those load as the unknown value.

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_tags<'de, D>(deserializer: D) -> Result<Vec<Tag>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(name) => Tag::Name(name),
                other => Tag::Unflattened(other),
            })
            .collect(),
        _ => Vec::new(),
    })
}

impl DramaRecord {
    /// A record with every canonical field at its "unknown" value.
    #[must_use]
    pub fn empty(id: DramaId) -> Self {
        Self {
            id,
            sources: Vec::new(),
            title: String::new(),
            kind: String::new(),
            episodes: empty_value(),
            status: String::new(),
            year: empty_value(),
            picture: String::new(),
            thumbnail: String::new(),
            synonyms: Vec::new(),
            tags: Vec::new(),
            foreign: Map::new(),
        }
    }

    /// Overwrites every canonical field except the id with `other`'s values.
    ///
    /// Foreign keys already present on `self` are left alone.
    pub fn replace_contents(&mut self, other: Self) {
        let id = self.id;
        let foreign = std::mem::take(&mut self.foreign);
        *self = Self {
            id,
            foreign,
            ..other
        };
    }

    #[must_use]
    pub fn has_foreign_fields(&self) -> bool {
        !self.foreign.is_empty()
    }

    #[must_use]
    pub fn tags_are_flat(&self) -> bool {
        self.tags.iter().all(|tag| matches!(tag, Tag::Name(_)))
    }
}

/// A tag or genre entry.
///
/// The catalog returns tags either as bare strings or as objects such as
/// `{"id": 3, "name": "Romance"}`. Older database files still contain the
/// object form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tag {
    Name(String),
    Unflattened(Value),
}

impl Tag {
    /// Converts one raw tag/genre entry: objects with a non-empty string
    /// `name` become that name, strings stay strings, anything else is
    /// carried verbatim for the maintenance pass to drop.
    #[must_use]
    pub fn from_raw(value: &Value) -> Self {
        match value {
            Value::String(name) => Self::Name(name.clone()),
            Value::Object(map) => match map.get("name") {
                Some(Value::String(name)) if !name.is_empty() => Self::Name(name.clone()),
                _ => Self::Unflattened(value.clone()),
            },
            other => Self::Unflattened(other.clone()),
        }
    }

    /// Reduces a tag to a bare name for the maintenance pass.
    ///
    /// Returns `None` for entries that have no usable name: objects without
    /// a non-empty string `name`, and non-string scalars.
    #[must_use]
    pub fn into_name(self) -> Option<String> {
        match self {
            Self::Name(name) => Some(name),
            Self::Unflattened(Value::Object(mut map)) => match map.remove("name") {
                Some(Value::String(name)) if !name.is_empty() => Some(name),
                _ => None,
            },
            Self::Unflattened(_) => None,
        }
    }

    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Unflattened(_) => None,
        }
    }
}

impl From<&str> for Tag {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

/// An unprocessed catalog response for a single title (or a calendar/update
/// entry that references one).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawDrama(Value);

impl RawDrama {
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self(value)
    }

    /// The title id carried in the `id` key.
    #[must_use]
    pub fn id(&self) -> Option<DramaId> {
        self.id_field("id")
    }

    /// The title id carried under `key`; calendar entries use `rid`.
    #[must_use]
    pub fn id_field(&self, key: &str) -> Option<DramaId> {
        self.0.get(key).and_then(DramaId::from_json)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for RawDrama {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
