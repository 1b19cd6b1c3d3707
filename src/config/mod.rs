//! Configuration module for the Harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A loaded [`HarvesterConfig`] is handed to
//! [`HarvesterBuilder::from_config`](crate::crawler::HarvesterBuilder::from_config).
//!
//! # Example
//!
//! ```no_run
//! use harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvester.toml")).unwrap();
//! println!("Depth limit: {}", config.depth_limit);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{HarvesterConfig, HttpConfig, DEFAULT_ROBOTS_AGENT};

// Re-export parser and validation functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
