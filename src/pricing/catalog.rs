//! Accepted parameter values and request validation.

use serde::Deserialize;

use crate::types::Identifier;
use crate::{MuninnError, Result};

/// Raw pricing request parameters, as they arrive from the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriceQuery {
    pub period: Option<String>,
    pub hotel: Option<String>,
    pub room: Option<String>,
}

impl PriceQuery {
    pub fn new(
        period: impl Into<String>,
        hotel: impl Into<String>,
        room: impl Into<String>,
    ) -> Self {
        Self {
            period: Some(period.into()),
            hotel: Some(hotel.into()),
            room: Some(room.into()),
        }
    }
}

/// The values accepted for each identifier dimension.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Catalog {
    #[serde(default = "default_periods")]
    pub periods: Vec<String>,
    #[serde(default = "default_hotels")]
    pub hotels: Vec<String>,
    #[serde(default = "default_rooms")]
    pub rooms: Vec<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            periods: default_periods(),
            hotels: default_hotels(),
            rooms: default_rooms(),
        }
    }
}

fn default_periods() -> Vec<String> {
    to_strings(&["Summer", "Autumn", "Winter", "Spring"])
}

fn default_hotels() -> Vec<String> {
    to_strings(&["FloatingPointResort", "GitawayHotel", "RecursionRetreat"])
}

fn default_rooms() -> Vec<String> {
    to_strings(&["SingletonRoom", "BooleanTwin", "RestfulKing"])
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

impl Catalog {
    /// Validate `query` into an [`Identifier`].
    ///
    /// Presence is checked first: any absent or empty field yields
    /// [`MuninnError::MissingParameters`]. Values are then checked in
    /// period, hotel, room order, reporting the first unknown one.
    pub fn identifier(&self, query: &PriceQuery) -> Result<Identifier> {
        let (Some(period), Some(hotel), Some(room)) = (
            non_empty(&query.period),
            non_empty(&query.hotel),
            non_empty(&query.room),
        ) else {
            return Err(MuninnError::MissingParameters);
        };

        check("period", period, &self.periods)?;
        check("hotel", hotel, &self.hotels)?;
        check("room", room, &self.rooms)?;

        Ok(Identifier::new(period, hotel, room))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn check(name: &'static str, value: &str, allowed: &[String]) -> Result<()> {
    if allowed.iter().any(|a| a == value) {
        Ok(())
    } else {
        Err(MuninnError::InvalidParameter {
            name,
            allowed: allowed.to_vec(),
        })
    }
}
