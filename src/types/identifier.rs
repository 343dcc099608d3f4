//! Identifier of one priceable unit.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A `(period, hotel, room)` combination, the unit the oracle prices.
///
/// Equality and hashing are structural. [`cache_key()`](Self::cache_key)
/// gives the stable string encoding used as the store key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    pub period: String,
    pub hotel: String,
    pub room: String,
}

impl Identifier {
    /// Create a new identifier.
    pub fn new(
        period: impl Into<String>,
        hotel: impl Into<String>,
        room: impl Into<String>,
    ) -> Self {
        Self {
            period: period.into(),
            hotel: hotel.into(),
            room: room.into(),
        }
    }

    /// Store key: `{period}-{hotel}-{room}`.
    ///
    /// Changing this format invalidates every stored entry. Components that
    /// themselves contain `-` or `\` have those characters backslash-escaped
    /// so that two distinct identifiers never share a key; for the usual
    /// hyphen-free values the output is exactly the plain format.
    pub fn cache_key(&self) -> String {
        let mut key =
            String::with_capacity(self.period.len() + self.hotel.len() + self.room.len() + 2);
        push_escaped(&mut key, &self.period);
        key.push('-');
        push_escaped(&mut key, &self.hotel);
        key.push('-');
        push_escaped(&mut key, &self.room);
        key
    }
}

fn push_escaped(out: &mut String, component: &str) {
    for c in component.chars() {
        if c == '-' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.period, self.hotel, self.room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_plain_format() {
        let id = Identifier::new("Summer", "FloatingPointResort", "SingletonRoom");
        assert_eq!(id.cache_key(), "Summer-FloatingPointResort-SingletonRoom");
    }

    #[test]
    fn cache_key_is_injective_for_hyphenated_components() {
        let a = Identifier::new("a-b", "c", "d");
        let b = Identifier::new("a", "b-c", "d");
        assert_ne!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key(), r"a\-b-c-d");
    }

    #[test]
    fn cache_key_escapes_backslash() {
        let a = Identifier::new(r"a\", "b", "c");
        let b = Identifier::new("a", r"\b", "c");
        assert_ne!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn structural_equality() {
        let a = Identifier::new("Winter", "GitawayHotel", "BooleanTwin");
        let b = Identifier::new("Winter".to_string(), "GitawayHotel", "BooleanTwin");
        assert_eq!(a, b);
        assert_ne!(a, Identifier::new("Winter", "GitawayHotel", "RestfulKing"));
    }

    #[test]
    fn display_is_space_separated() {
        let id = Identifier::new("Spring", "RecursionRetreat", "RestfulKing");
        assert_eq!(id.to_string(), "Spring RecursionRetreat RestfulKing");
    }
}
