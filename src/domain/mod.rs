//! Domain primitives for the drama catalog.
//!
//! Newtypes keep catalog ids and calendar quarters from being mixed up with
//! the plain integers that flow through the HTTP layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Unique identifier of a title in the MyDramaList catalog.
///
/// # Examples
///
/// ```rust
/// use dramarr::domain::DramaId;
///
/// let id = DramaId::new(42);
/// assert_eq!(id.value(), 42);
/// assert_eq!(id.to_string(), "42");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DramaId(u64);

impl DramaId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Reads an id out of a loosely typed JSON value.
    ///
    /// The catalog sends ids as integers, but some endpoints have been seen
    /// returning them as decimal strings. Anything else (floats, negatives,
    /// nulls, blanks) is not a usable id.
    ///
    /// ```rust
    /// use dramarr::domain::DramaId;
    /// use serde_json::json;
    ///
    /// assert_eq!(DramaId::from_json(&json!(7)), Some(DramaId::new(7)));
    /// assert_eq!(DramaId::from_json(&json!(" 7 ")), Some(DramaId::new(7)));
    /// assert_eq!(DramaId::from_json(&json!(-1)), None);
    /// assert_eq!(DramaId::from_json(&json!(null)), None);
    /// ```
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().map(Self),
            Value::String(s) => s.trim().parse().ok().map(Self),
            _ => None,
        }
    }
}

impl fmt::Display for DramaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<DramaId> for u64 {
    fn from(id: DramaId) -> Self {
        id.0
    }
}

impl From<u64> for DramaId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl Serialize for DramaId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for DramaId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid drama id: {value}")))
    }
}

/// Calendar quarter used by the catalog's seasonal listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub const ALL: [Self; 4] = [Self::Q1, Self::Q2, Self::Q3, Self::Q4];

    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Q1 => 1,
            Self::Q2 => 2,
            Self::Q3 => 3,
            Self::Q4 => 4,
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}
