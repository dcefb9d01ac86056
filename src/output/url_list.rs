//! The crawled URL list
//!
//! Written at the end of a crawl and read back by the extraction pipeline.

use crate::output::{timestamp, write_json, OutputError, OutputResult};
use crate::state::SessionSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Every URL a crawl visited, plus the ones only dynamic discovery revealed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlList {
    pub base_url: String,

    #[serde(default)]
    pub total_urls_found: usize,

    #[serde(default)]
    pub dynamic_urls_found: usize,

    #[serde(default)]
    pub crawl_timestamp: String,

    /// Hash of the configuration the crawl ran with
    #[serde(default)]
    pub config_hash: String,

    /// Sorted visited set
    pub unique_urls: Vec<String>,

    /// Sorted dynamic set
    #[serde(default)]
    pub dynamic_urls: Vec<String>,
}

impl UrlList {
    pub fn from_snapshot(
        base_url: impl Into<String>,
        snapshot: &SessionSnapshot,
        config_hash: impl Into<String>,
    ) -> Self {
        let mut unique_urls = snapshot.visited.clone();
        unique_urls.sort();
        let mut dynamic_urls = snapshot.dynamic.clone();
        dynamic_urls.sort();

        Self {
            base_url: base_url.into(),
            total_urls_found: unique_urls.len(),
            dynamic_urls_found: dynamic_urls.len(),
            crawl_timestamp: timestamp(),
            config_hash: config_hash.into(),
            unique_urls,
            dynamic_urls,
        }
    }

    pub fn write(&self, path: &Path) -> OutputResult<()> {
        write_json(path, self)?;
        tracing::info!(
            "URL list saved to {} ({} URLs, {} dynamic)",
            path.display(),
            self.total_urls_found,
            self.dynamic_urls_found
        );
        Ok(())
    }

    /// Reads a URL list, dropping entries that are not http(s)
    pub fn load(path: &Path) -> OutputResult<Self> {
        let contents = fs::read_to_string(path).map_err(|source| OutputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut list: UrlList =
            serde_json::from_str(&contents).map_err(|source| OutputError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        let before = list.unique_urls.len();
        list.unique_urls.retain(|url| is_web_url(url));
        list.dynamic_urls.retain(|url| is_web_url(url));
        if list.unique_urls.len() < before {
            tracing::warn!(
                "Skipping {} non-http(s) entries in {}",
                before - list.unique_urls.len(),
                path.display()
            );
        }

        Ok(list)
    }

    /// Pages to extract, each with whether it was found dynamically
    pub fn targets(&self) -> Vec<(String, bool)> {
        let dynamic: HashSet<&str> = self.dynamic_urls.iter().map(String::as_str).collect();
        self.unique_urls
            .iter()
            .map(|url| (url.clone(), dynamic.contains(url.as_str())))
            .collect()
    }
}

fn is_web_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_snapshot_sorts_sets() {
        let snapshot = SessionSnapshot {
            visited: vec![
                "https://example.com/b".to_string(),
                "https://example.com/a".to_string(),
            ],
            dynamic: vec!["https://example.com/b".to_string()],
            ..Default::default()
        };

        let list = UrlList::from_snapshot("https://example.com/", &snapshot, "abc123");

        assert_eq!(list.unique_urls, vec!["https://example.com/a", "https://example.com/b"]);
        assert_eq!(list.total_urls_found, 2);
        assert_eq!(list.dynamic_urls_found, 1);
        assert_eq!(list.config_hash, "abc123");
        assert_eq!(
            list.targets(),
            vec![
                ("https://example.com/a".to_string(), false),
                ("https://example.com/b".to_string(), true),
            ]
        );
    }

    #[test]
    fn test_write_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("crawled_urls.json");
        let snapshot = SessionSnapshot {
            visited: vec!["https://example.com/".to_string()],
            ..Default::default()
        };

        let list = UrlList::from_snapshot("https://example.com/", &snapshot, "");
        list.write(&path).unwrap();

        assert_eq!(UrlList::load(&path).unwrap(), list);
    }

    #[test]
    fn test_load_filters_schemes_and_defaults_optional_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("urls.json");
        fs::write(
            &path,
            r#"{"base_url": "https://example.com/",
                "unique_urls": ["https://example.com/", "mailto:a@example.com", "ftp://example.com/f"]}"#,
        )
        .unwrap();

        let list = UrlList::load(&path).unwrap();
        assert_eq!(list.unique_urls, vec!["https://example.com/"]);
        assert!(list.dynamic_urls.is_empty());
        assert_eq!(list.targets().len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = UrlList::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, OutputError::Io { .. }));
    }
}
