//! Application use cases / business logic

pub mod cache;
pub mod lookup;

#[cfg(test)]
pub(crate) mod fakes;

pub use cache::{DEFAULT_DATA_UNAVAILABLE_TTL, ResultCache, SCHEMA_VERSION, namespace};
pub use lookup::{GradeLookup, GradeLookupConfig};
