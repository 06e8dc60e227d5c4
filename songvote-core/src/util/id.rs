use std::cmp::Ordering;
use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::ValidationError;

/// A unique identifier for any type.
pub struct Id<T> {
    value: Uuid,
    kind: PhantomData<T>,
}

impl<T> Id<T> {
    /// Creates a new random id.
    pub fn new() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Returns an empty id.
    pub fn none() -> Self {
        Self::from_uuid(Uuid::nil())
    }

    pub fn from_uuid(value: Uuid) -> Self {
        Self {
            value,
            kind: PhantomData,
        }
    }

    /// Parses an id from user input, rejecting blank, malformed and nil values.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::MalformedId(input.to_string()));
        }

        let value =
            Uuid::parse_str(trimmed).map_err(|_| ValidationError::MalformedId(input.to_string()))?;

        if value.is_nil() {
            return Err(ValidationError::MalformedId(input.to_string()));
        }

        Ok(Self::from_uuid(value))
    }

    pub fn is_none(&self) -> bool {
        self.value.is_nil()
    }

    pub fn value(&self) -> Uuid {
        self.value
    }
}

impl<T> Default for Id<T> {
    fn default() -> Self {
        Self::none()
    }
}

impl<T> FromStr for Id<T> {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<T> From<Uuid> for Id<T> {
    fn from(value: Uuid) -> Self {
        Self::from_uuid(value)
    }
}

impl<T> Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state)
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}
impl<T> Eq for Id<T> {}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Uuid::deserialize(deserializer).map(Self::from_uuid)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct Marker;

    #[test]
    fn test_parse() {
        let id = Id::<Marker>::new();
        let parsed = Id::<Marker>::parse(&id.to_string()).expect("parses");

        assert_eq!(id, parsed);
        assert_eq!(
            Id::<Marker>::parse(&format!("  {}  ", id)).expect("parses trimmed"),
            id
        );

        assert!(Id::<Marker>::parse("").is_err(), "blank ids are rejected");
        assert!(Id::<Marker>::parse("song-1").is_err(), "non-uuid ids are rejected");
        assert!(
            Id::<Marker>::parse("00000000-0000-0000-0000-000000000000").is_err(),
            "nil ids are rejected"
        );
    }
}
