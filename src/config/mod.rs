//! Configuration module for Scholar-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use scholar_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Collecting {} records", config.crawler.target_count);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, DelayRange, IdentityConfig, OutputConfig, QueryConfig,
    DEFAULT_IDENTITIES,
};

// Re-export parser functions
pub use parser::{load_config, load_config_with_hash, parse_config};
pub use validation::validate;
