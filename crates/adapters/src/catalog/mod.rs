//! Grocery catalog adapters

mod client;
mod stub;

pub use client::{CatalogClient, DEFAULT_BASE_URL};
pub use stub::{CatalogFileError, StubCatalog};
