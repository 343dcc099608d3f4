//! Value types shared by the cache, the oracle client and the service.

mod identifier;
mod rate;
mod reference;

pub use identifier::Identifier;
pub use rate::Rate;
pub use reference::Reference;
