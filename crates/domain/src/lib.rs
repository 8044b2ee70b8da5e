//! nutri-grade domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `points`: Threshold point tables
//! - `revision`: Named, immutable scoring configurations
//! - `classifier`: Category names to category flags
//! - `scoring`: Score aggregation and grading
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `usecases`: Result cache and lookup orchestration

pub mod classifier;
pub mod model;
pub mod points;
pub mod ports;
pub mod revision;
pub mod scoring;
pub mod usecases;

pub use classifier::{CategoryRules, KeywordRule, RulesError};
pub use model::*;
pub use ports::*;
pub use revision::{Revision, RevisionId};
pub use scoring::{Assessment, Exclusion, Formula, Graded, ScoreError, compute_grade, score};
