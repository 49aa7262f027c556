//! Shared types, error model, and configuration for plugindoc.
//!
//! This crate is the foundation depended on by all other plugindoc crates.
//! It provides:
//! - [`PluginDocError`]: the unified error type
//! - Domain types ([`PluginRef`], [`PackageManifest`], [`ParameterRow`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BadgesConfig, CacheConfig, ProjectConfig, RedirectsConfig, TypedocConfig,
    config_dir, home_config_path, init_config, load_config, load_config_from,
};
pub use error::{PluginDocError, Result};
pub use types::{PackageManifest, ParameterRow, PluginRef, map_parameter_type, pluralize_type};
