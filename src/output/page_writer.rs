//! Per-page artifact directories
//!
//! Layout of one page directory:
//!
//! ```text
//! <output-dir>/<identifier>/
//!     page.html
//!     url_info.json
//!     components/<kind>/<id>.html
//!     components/<kind>/component_summary.json
//!     component_index.json
//!     component_index.html
//!     <strategy>_analysis.json
//!     comprehensive_analysis.json
//! ```
//!
//! `comprehensive_analysis.json` is written last and marks the page complete.

use crate::analysis::StrategyResult;
use crate::components::{ComponentMap, ComponentRecord};
use crate::output::render::{component_index_page, component_page};
use crate::output::{create_dir, timestamp, write_json, write_text, OutputResult};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File whose presence means a page needs no further work
pub const COMPLETION_MARKER: &str = "comprehensive_analysis.json";

/// Characters of text kept per component in `component_summary.json`
const SUMMARY_PREVIEW_CHARS: usize = 100;

/// Everything produced for one page
#[derive(Debug, Clone)]
pub struct PageArtifacts {
    pub url: String,
    pub is_dynamic: bool,
    pub status: u16,
    pub content_type: String,
    pub html: String,
    pub components: ComponentMap,
    pub analyses: Vec<StrategyResult>,
}

#[derive(Debug, Serialize)]
struct UrlInfo<'a> {
    original_url: &'a str,
    page_identifier: &'a str,
    is_dynamic: bool,
    status_code: u16,
    content_type: &'a str,
    content_length: usize,
    extraction_timestamp: String,
}

#[derive(Debug, Serialize)]
struct ComprehensiveAnalysis<'a> {
    url: &'a str,
    page_id: &'a str,
    is_dynamic: bool,
    analysis_timestamp: String,
    strategies: Map<String, Value>,
}

#[derive(Debug, Serialize)]
struct ComponentSummary<'a> {
    component_type: &'a str,
    total_components: usize,
    components: Vec<ComponentSummaryEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct ComponentSummaryEntry<'a> {
    id: &'a str,
    tag: &'a str,
    classes: &'a [String],
    text_preview: String,
}

/// Contents of `component_index.json`
#[derive(Debug, Clone, Serialize)]
pub struct ComponentIndex {
    pub extraction_timestamp: String,
    /// Keyed by component directory name
    pub component_types: BTreeMap<&'static str, IndexEntry>,
    pub total_components: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexEntry {
    #[serde(skip)]
    pub title: String,
    pub count: usize,
    pub files: Vec<String>,
}

/// Writes page directories under one output root
#[derive(Debug, Clone)]
pub struct PageWriter {
    root: PathBuf,
}

impl PageWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn page_dir(&self, identifier: &str) -> PathBuf {
        self.root.join(identifier)
    }

    /// Whether a previous run already finished this page
    pub fn is_complete(&self, identifier: &str) -> bool {
        self.page_dir(identifier).join(COMPLETION_MARKER).exists()
    }

    /// Writes every artifact of a page, the completion marker last
    ///
    /// Returns the number of components written.
    pub fn write(&self, identifier: &str, artifacts: &PageArtifacts) -> OutputResult<usize> {
        let dir = self.page_dir(identifier);
        create_dir(&dir)?;

        write_text(&dir.join("page.html"), &artifacts.html)?;

        let index = write_components(&dir, identifier, &artifacts.components)?;

        write_json(
            &dir.join("url_info.json"),
            &UrlInfo {
                original_url: &artifacts.url,
                page_identifier: identifier,
                is_dynamic: artifacts.is_dynamic,
                status_code: artifacts.status,
                content_type: &artifacts.content_type,
                content_length: artifacts.html.len(),
                extraction_timestamp: timestamp(),
            },
        )?;

        let mut strategies = Map::new();
        for result in &artifacts.analyses {
            write_json(
                &dir.join(format!("{}_analysis.json", result.strategy)),
                &result.metrics,
            )?;
            strategies.insert(result.strategy.to_string(), result.metrics.clone());
        }

        write_json(
            &dir.join(COMPLETION_MARKER),
            &ComprehensiveAnalysis {
                url: &artifacts.url,
                page_id: identifier,
                is_dynamic: artifacts.is_dynamic,
                analysis_timestamp: timestamp(),
                strategies,
            },
        )?;

        Ok(index.total_components)
    }
}

fn write_components(
    page_dir: &Path,
    identifier: &str,
    components: &ComponentMap,
) -> OutputResult<ComponentIndex> {
    let components_dir = page_dir.join("components");
    create_dir(&components_dir)?;

    let mut index = ComponentIndex {
        extraction_timestamp: timestamp(),
        component_types: BTreeMap::new(),
        total_components: 0,
    };

    for (kind, records) in components {
        if records.is_empty() {
            continue;
        }
        let kind_dir = components_dir.join(kind.directory());
        create_dir(&kind_dir)?;

        let mut files = Vec::with_capacity(records.len());
        for record in records {
            let file = format!("{}.html", record.id);
            write_text(&kind_dir.join(&file), &component_page(record))?;
            files.push(file);
        }

        write_json(
            &kind_dir.join("component_summary.json"),
            &ComponentSummary {
                component_type: kind.directory(),
                total_components: records.len(),
                components: records.iter().map(summary_entry).collect(),
            },
        )?;

        index.total_components += files.len();
        index.component_types.insert(
            kind.directory(),
            IndexEntry {
                title: kind.title(),
                count: files.len(),
                files,
            },
        );
    }

    write_json(&page_dir.join("component_index.json"), &index)?;
    write_text(
        &page_dir.join("component_index.html"),
        &component_index_page(identifier, &index),
    )?;

    Ok(index)
}

fn summary_entry(record: &ComponentRecord) -> ComponentSummaryEntry<'_> {
    ComponentSummaryEntry {
        id: &record.id,
        tag: &record.tag,
        classes: &record.classes,
        text_preview: record.text_preview.chars().take(SUMMARY_PREVIEW_CHARS).collect(),
    }
}
