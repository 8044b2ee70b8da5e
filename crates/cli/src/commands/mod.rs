//! Subcommand implementations

pub mod cache;
pub mod config;
pub mod doctor;
pub mod grade;
pub mod lookup;
pub mod rules;
