//! Configuration module for Sumi-Strata
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sumi_strata::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("strata.toml")).unwrap();
//! println!("Crawler will stop after {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, Config, CrawlMode, CrawlerConfig, DiscoveryConfig, FetchMode, OutputConfig,
    UserAgentConfig, EXHAUSTIVE_MAX_DEPTH,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
