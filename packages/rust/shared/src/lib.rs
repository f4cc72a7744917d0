//! Shared types, error model, and configuration for KeywordForge.
//!
//! This crate is the foundation depended on by all other KeywordForge crates.
//! It provides:
//! - [`KeywordForgeError`] — the unified error type
//! - Domain types ([`KeywordBatch`], [`ClusterSnapshot`], [`OutlineBatch`], [`BatchId`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, EmbeddingConfig, ReportConfig, config_dir, config_file_path,
    expand_home, init_config, load_config, load_config_from, validate_api_key,
};
pub use error::{KeywordForgeError, Result};
pub use types::{
    BatchId, ClusterSnapshot, KeywordBatch, OutlineBatch, OutlineRecord, RefinedOutlineBatch,
    validate_email,
};
