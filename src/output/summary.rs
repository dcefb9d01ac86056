//! Run-level extraction summary (`comprehensive_summary.json`)

use crate::components::ComponentKind;
use crate::output::page_writer::COMPLETION_MARKER;
use crate::output::{timestamp, write_json, OutputResult};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const SUMMARY_FILE: &str = "comprehensive_summary.json";

/// Counters accumulated while extracting a URL list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionTotals {
    pub total_urls: usize,
    pub dynamic_urls: usize,
    /// Pages extracted in this run
    pub extracted: usize,
    /// Pages already complete from an earlier run
    pub skipped: usize,
    pub failed: usize,
    pub components: usize,
}

impl ExtractionTotals {
    /// Pages that are complete on disk, skipped ones included
    pub fn successful(&self) -> usize {
        self.extracted + self.skipped
    }

    pub fn finished(&self) -> usize {
        self.successful() + self.failed
    }

    pub fn remaining(&self) -> usize {
        self.total_urls.saturating_sub(self.finished())
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_urls == 0 {
            0.0
        } else {
            self.successful() as f64 / self.total_urls as f64
        }
    }
}

/// Contents of `comprehensive_summary.json`
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    analysis_overview: AnalysisOverview,
    analysis_strategies: Vec<String>,
    output_structure: OutputStructure,
    component_extraction: ComponentCatalogue,
    analysis_timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
struct AnalysisOverview {
    total_urls: usize,
    dynamic_urls: usize,
    static_urls: usize,
    successful_analyses: usize,
    skipped_pages: usize,
    failed_analyses: usize,
    success_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
struct OutputStructure {
    individual_page_folders: usize,
    files_per_page: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
struct ComponentCatalogue {
    component_types: Vec<&'static str>,
    components_extracted: usize,
}

impl RunSummary {
    pub fn new(totals: &ExtractionTotals, strategies: &[&str]) -> Self {
        let mut files_per_page: Vec<String> = [
            "page.html",
            "url_info.json",
            COMPLETION_MARKER,
            "component_index.json",
            "component_index.html",
            "components/",
        ]
        .iter()
        .map(|f| f.to_string())
        .collect();
        files_per_page.extend(strategies.iter().map(|s| format!("{}_analysis.json", s)));

        Self {
            analysis_overview: AnalysisOverview {
                total_urls: totals.total_urls,
                dynamic_urls: totals.dynamic_urls,
                static_urls: totals.total_urls.saturating_sub(totals.dynamic_urls),
                successful_analyses: totals.successful(),
                skipped_pages: totals.skipped,
                failed_analyses: totals.failed,
                success_rate: totals.success_rate(),
            },
            analysis_strategies: strategies.iter().map(|s| s.to_string()).collect(),
            output_structure: OutputStructure {
                individual_page_folders: totals.successful(),
                files_per_page,
            },
            component_extraction: ComponentCatalogue {
                component_types: ComponentKind::ALL.iter().map(|k| k.directory()).collect(),
                components_extracted: totals.components,
            },
            analysis_timestamp: timestamp(),
        }
    }

    /// Writes the summary into `output_dir`, returning the file path
    pub fn write(&self, output_dir: &Path) -> OutputResult<PathBuf> {
        let path = output_dir.join(SUMMARY_FILE);
        write_json(&path, self)?;
        tracing::info!("Comprehensive summary saved to {}", path.display());
        Ok(path)
    }
}
