use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Links kept on a record fetched over plain HTTP
pub const STATIC_LINK_SAMPLE: usize = 15;

/// Links kept on a record produced by a rendered session
pub const RENDERED_LINK_SAMPLE: usize = 20;

/// How a page was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMethod {
    /// Plain HTTP fetch
    Static,
    /// Rendered session, no links revealed by interaction
    Rendered,
    /// Rendered session where interaction revealed at least one new link
    RenderedDynamic,
}

impl DiscoveryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Rendered => "rendered",
            Self::RenderedDynamic => "rendered_dynamic",
        }
    }

    /// Cap on the link sample stored for this method
    pub fn link_sample(&self) -> usize {
        match self {
            Self::Static => STATIC_LINK_SAMPLE,
            Self::Rendered | Self::RenderedDynamic => RENDERED_LINK_SAMPLE,
        }
    }
}

impl fmt::Display for DiscoveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of crawling one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub title: String,
    pub depth: u32,
    pub method: DiscoveryMethod,

    /// Distinct eligible links, initial and dynamic together
    pub links_found: usize,

    /// Eligible links present before any interaction
    pub initial_links: usize,

    /// Eligible links revealed only by interaction
    pub dynamic_links: usize,

    /// Capped sample of the links, in discovery order
    pub links: Vec<String>,

    pub has_pagination: bool,
    pub has_dynamic_content: bool,
}

impl PageRecord {
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        depth: u32,
        method: DiscoveryMethod,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            depth,
            method,
            links_found: 0,
            initial_links: 0,
            dynamic_links: 0,
            links: Vec::new(),
            has_pagination: false,
            has_dynamic_content: false,
        }
    }

    /// Fills in the link counts and sample
    pub fn with_links(mut self, initial: &[String], dynamic: &[String]) -> Self {
        let mut seen = HashSet::new();
        let all: Vec<&String> = initial
            .iter()
            .chain(dynamic.iter())
            .filter(|link| seen.insert(link.as_str()))
            .collect();

        self.initial_links = initial.len();
        self.dynamic_links = dynamic.len();
        self.links_found = all.len();
        self.links = all
            .into_iter()
            .take(self.method.link_sample())
            .cloned()
            .collect();
        self
    }

    pub fn with_flags(mut self, has_pagination: bool, has_dynamic_content: bool) -> Self {
        self.has_pagination = has_pagination;
        self.has_dynamic_content = has_dynamic_content;
        self
    }
}
