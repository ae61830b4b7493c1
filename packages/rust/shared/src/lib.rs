//! Shared types, error model, and configuration for listing-rewriter.
//!
//! This crate is the foundation depended on by all other listing-rewriter crates.
//! It provides:
//! - [`ListingError`], the unified error type
//! - Domain types ([`PropertyId`], [`PropertyRecord`], [`PropertySummary`], [`Rewrite`])
//! - Configuration ([`AppConfig`], [`InferenceConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DatabaseConfig, InferenceConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{ListingError, Result};
pub use types::{PropertyId, PropertyRecord, PropertySummary, Rewrite};
