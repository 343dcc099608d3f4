//! JSON shapes exchanged with the pricing oracle.

use serde::{Deserialize, Serialize};

use crate::types::{Identifier, Rate};

/// `POST /pricing` body: `{"attributes": [{"period","hotel","room"}, ...]}`.
#[derive(Debug, Serialize)]
pub struct PricingRequest<'a> {
    pub attributes: &'a [Identifier],
}

/// `POST /pricing` answer: `{"rates": [...]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PricingResponse {
    pub rates: Vec<OracleRate>,
}

/// One priced identifier as returned by the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleRate {
    pub period: String,
    pub hotel: String,
    pub room: String,
    pub rate: Rate,
}

impl OracleRate {
    /// The identifier this rate prices.
    pub fn identifier(&self) -> Identifier {
        Identifier::new(self.period.clone(), self.hotel.clone(), self.room.clone())
    }
}
