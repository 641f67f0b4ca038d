//! Host property protocol: addresses, wire values, and the dispatch store

pub mod address;
pub mod store;
pub mod value;

#[cfg(test)]
mod tests;

pub use address::{ClassId, Element, PropertyAddress, Scope, Selector};
pub use store::{CHANGE_SAMPLE_RATE, PropertyStore, SetOutcome};
pub use value::PropertyValue;
