//! Sumi-Strata: a site cartographer that reads pages in layers
//!
//! This crate crawls a single website (following links revealed by client-side
//! pagination, load-more controls and infinite scroll), then decomposes every
//! crawled page into categorized structural components and runs eight
//! independent analysis passes over it.

pub mod analysis;
pub mod browser;
pub mod components;
pub mod config;
pub mod crawler;
pub mod output;
pub mod pipeline;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Strata operations
#[derive(Debug, Error)]
pub enum StrataError {
    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Sumi-Strata operations
pub type Result<T> = std::result::Result<T, StrataError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlReport, PageRecord};
pub use state::{CrawlSession, DispatchState};
pub use url::{is_eligible, page_identifier, LinkPolicy};
