//! Configuration loading and env substitution.
//!
//! Config files: `plugcheck.toml`, `plugcheck.yaml`, `plugcheck.yml` or
//! `plugcheck.json`. Searched in `./` then `~/.config/plugcheck/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{config_dir, discover_and_load, load_config, load_or_default},
    schema::{OutputConfig, OutputFormat, PlugcheckConfig, ScanConfig},
};
