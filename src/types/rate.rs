//! Price value as reported by the oracle.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// A price, kept as the decimal text the oracle sent.
///
/// The oracle may encode rates as JSON strings (`"12000"`) or numbers
/// (`12000`); both deserialize to the same `Rate`. Serializes as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Rate(String);

impl Rate {
    /// Create a rate from its textual form.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The rate's decimal text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Rate {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Rate {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u64> for Rate {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRate {
    Text(String),
    Number(serde_json::Number),
}

impl<'de> Deserialize<'de> for Rate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawRate::deserialize(deserializer)? {
            RawRate::Text(s) => Rate(s),
            RawRate::Number(n) => Rate(n.to_string()),
        })
    }
}
