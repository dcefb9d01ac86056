//! Output module for crawl and extraction artifacts
//!
//! This module handles:
//! - The crawled URL list that links the crawl to the extraction
//! - Crawl statistics and their console summary
//! - Per-page artifact directories (raw page, components, analyses)
//! - The run-level extraction summary

mod page_writer;
mod render;
pub mod stats;
mod summary;
mod url_list;

pub use page_writer::{ComponentIndex, IndexEntry, PageArtifacts, PageWriter, COMPLETION_MARKER};
pub use render::{component_index_page, component_page};
pub use stats::{print_summary, CrawlSummary};
pub use summary::{ExtractionTotals, RunSummary};
pub use url_list::UrlList;

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error on {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Local wall-clock time in the format used by every artifact
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Writes a value as pretty-printed JSON
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> OutputResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|source| OutputError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    write_text(path, &json)
}

pub(crate) fn write_text(path: &Path, contents: &str) -> OutputResult<()> {
    fs::write(path, contents).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn create_dir(path: &Path) -> OutputResult<()> {
    fs::create_dir_all(path).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })
}
