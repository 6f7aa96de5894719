//! Explicit "unknown" marker for projected profile data.
//!
//! A dataset omission is information in its own right. `Field::Unknown`
//! carries it through projection, prompting and the final insight, so that a
//! missing follower count can never be confused with zero followers.

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Field<T> {
    Known(T),
    #[default]
    Unknown,
}

impl<T> Field<T> {
    #[must_use]
    pub fn is_known(&self) -> bool {
        matches!(self, Field::Known(_))
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Field::Unknown)
    }

    #[must_use]
    pub fn as_known(&self) -> Option<&T> {
        match self {
            Field::Known(value) => Some(value),
            Field::Unknown => None,
        }
    }

    #[must_use]
    pub fn into_known(self) -> Option<T> {
        match self {
            Field::Known(value) => Some(value),
            Field::Unknown => None,
        }
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Field::Unknown, Field::Known)
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Known(value) => value.serialize(serializer),
            Field::Unknown => serializer.serialize_none(),
        }
    }
}
