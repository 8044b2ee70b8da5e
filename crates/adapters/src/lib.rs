//! nutri-grade adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `store`: SQLite, JSON key-value and in-memory grade stores with fallback
//! - `catalog`: Grocery catalog HTTP adapter and offline stub
//! - `badges`: Presentation sinks for produced grades
//! - `rules`: TOML classifier rules loader

pub mod badges;
pub mod catalog;
mod rules_fs;
pub mod store;
mod store_kv;
mod store_memory;
mod store_sqlite;

/// Re-exports for classifier rules files
pub mod rules {
    pub use crate::rules_fs::{
        RulesFile, RulesFileError, load_rules, load_rules_or_default, rules_to_toml,
    };
}

/// Re-exports for grade store adapters
pub mod stores {
    pub use crate::store::{OpenedStore, StoreBackend, StoreSettings, open_grade_store};
    pub use crate::store_kv::KvGradeStore;
    pub use crate::store_memory::InMemoryGradeStore;
    pub use crate::store_sqlite::SqliteGradeStore;
}
