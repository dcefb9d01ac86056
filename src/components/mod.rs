//! Component classification
//!
//! This module decomposes a parsed page into fourteen kinds of structural
//! components (headers, navigation, cards, forms, tables and so on) using a
//! fixed pattern table. Every kind has a cap and a text preview length, so
//! extraction output is bounded and deterministic for a given document.

mod patterns;

pub use patterns::{ComponentPattern, PATTERNS};

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use thiserror::Error;

/// Errors raised while extracting one component kind
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid selector for {kind}: {reason}")]
    Selector { kind: ComponentKind, reason: String },

    #[error("extraction of {kind} panicked: {message}")]
    Panicked { kind: ComponentKind, message: String },
}

/// The fourteen component kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Header,
    Navigation,
    MainContent,
    Article,
    Card,
    Form,
    Table,
    List,
    Media,
    Footer,
    Sidebar,
    Modal,
    Button,
    Breadcrumb,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 14] = [
        Self::Header,
        Self::Navigation,
        Self::MainContent,
        Self::Article,
        Self::Card,
        Self::Form,
        Self::Table,
        Self::List,
        Self::Media,
        Self::Footer,
        Self::Sidebar,
        Self::Modal,
        Self::Button,
        Self::Breadcrumb,
    ];

    /// Name used in component ids
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Navigation => "navigation",
            Self::MainContent => "main_content",
            Self::Article => "article",
            Self::Card => "card",
            Self::Form => "form",
            Self::Table => "table",
            Self::List => "list",
            Self::Media => "media",
            Self::Footer => "footer",
            Self::Sidebar => "sidebar",
            Self::Modal => "modal",
            Self::Button => "button",
            Self::Breadcrumb => "breadcrumb",
        }
    }

    /// Directory name under `components/`
    pub fn directory(&self) -> &'static str {
        match self {
            Self::Header => "headers",
            Self::Navigation => "navigation",
            Self::MainContent => "main_content",
            Self::Article => "articles",
            Self::Card => "cards",
            Self::Form => "forms",
            Self::Table => "tables",
            Self::List => "lists",
            Self::Media => "media",
            Self::Footer => "footers",
            Self::Sidebar => "sidebars",
            Self::Modal => "modals",
            Self::Button => "buttons",
            Self::Breadcrumb => "breadcrumbs",
        }
    }

    /// Human-readable title, e.g. "Main Content"
    pub fn title(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" ")
    }

    pub fn pattern(&self) -> &'static ComponentPattern {
        // PATTERNS is declared in the same order as ALL
        &PATTERNS[*self as usize]
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts specific to a component kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ComponentDetails {
    Plain,
    Navigation { links_count: usize },
    MainContent { text_length: usize },
    Article { headings: usize, images: usize },
    Card { links: usize, images: usize },
    Form { action: String, method: String, inputs: usize },
    Table { rows: usize, headers: usize, cells: usize },
    Items { items: usize },
    Media { src: String, alt: String },
    Footer { links: usize },
    Sidebar { widgets: usize },
    Modal { buttons: usize },
    Button {
        #[serde(rename = "type")]
        kind: String,
        href: String,
    },
}

/// One extracted component
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentRecord {
    /// `{kind}_{n}`, 1-based within the kind
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    pub tag: String,
    pub classes: Vec<String>,
    pub html: String,
    pub text_preview: String,
    pub details: ComponentDetails,
}

/// Components of one page grouped by kind
///
/// Kinds with no matches are absent.
pub type ComponentMap = BTreeMap<ComponentKind, Vec<ComponentRecord>>;

/// Classifies a document into all fourteen component kinds
///
/// A kind whose extraction fails is logged and left out; the other kinds
/// are unaffected.
pub fn classify(document: &Html) -> ComponentMap {
    let mut components = ComponentMap::new();

    for pattern in PATTERNS.iter() {
        match extract_isolated(document, pattern) {
            Ok(records) if records.is_empty() => {}
            Ok(records) => {
                components.insert(pattern.kind, records);
            }
            Err(e) => tracing::error!("Component extraction failed: {}", e),
        }
    }

    components
}

/// Runs one kind's extraction, converting a panic into an error
pub fn extract_isolated(
    document: &Html,
    pattern: &ComponentPattern,
) -> Result<Vec<ComponentRecord>, ExtractError> {
    catch_unwind(AssertUnwindSafe(|| extract(document, pattern))).unwrap_or_else(|payload| {
        Err(ExtractError::Panicked {
            kind: pattern.kind,
            message: panic_message(payload.as_ref()),
        })
    })
}

/// Extracts up to `pattern.cap` components of one kind, in document order
pub fn extract(
    document: &Html,
    pattern: &ComponentPattern,
) -> Result<Vec<ComponentRecord>, ExtractError> {
    let selector = Selector::parse(&pattern.selector()).map_err(|e| ExtractError::Selector {
        kind: pattern.kind,
        reason: format!("{:?}", e),
    })?;

    Ok(document
        .select(&selector)
        .filter(|element| pattern.accepts_class(element.value().attr("class")))
        .take(pattern.cap)
        .enumerate()
        .map(|(index, element)| build_record(element, pattern, index + 1))
        .collect())
}

fn build_record(element: ElementRef<'_>, pattern: &ComponentPattern, n: usize) -> ComponentRecord {
    let text: String = element.text().collect();
    let preview_source = if pattern.trim_preview {
        text.trim()
    } else {
        text.as_str()
    };

    ComponentRecord {
        id: format!("{}_{}", pattern.kind, n),
        kind: pattern.kind,
        tag: element.value().name().to_string(),
        classes: element.value().classes().map(str::to_string).collect(),
        html: element.html(),
        text_preview: preview_source.chars().take(pattern.preview).collect(),
        details: details(element, pattern.kind, &text),
    }
}

fn details(element: ElementRef<'_>, kind: ComponentKind, text: &str) -> ComponentDetails {
    let attr = |name: &str| element.value().attr(name).unwrap_or("").to_string();

    match kind {
        ComponentKind::Header => ComponentDetails::Plain,
        ComponentKind::Navigation => ComponentDetails::Navigation {
            links_count: count_within(element, "a"),
        },
        ComponentKind::MainContent => ComponentDetails::MainContent {
            text_length: text.chars().count(),
        },
        ComponentKind::Article => ComponentDetails::Article {
            headings: count_within(element, "h1, h2, h3, h4, h5, h6"),
            images: count_within(element, "img"),
        },
        ComponentKind::Card => ComponentDetails::Card {
            links: count_within(element, "a"),
            images: count_within(element, "img"),
        },
        ComponentKind::Form => ComponentDetails::Form {
            action: attr("action"),
            method: element.value().attr("method").unwrap_or("get").to_string(),
            inputs: count_within(element, "input, textarea, select"),
        },
        ComponentKind::Table => ComponentDetails::Table {
            rows: count_within(element, "tr"),
            headers: count_within(element, "th"),
            cells: count_within(element, "td, th"),
        },
        ComponentKind::List => {
            let item = if element.value().name() == "dl" { "dt" } else { "li" };
            ComponentDetails::Items {
                items: count_within(element, item),
            }
        }
        ComponentKind::Media => ComponentDetails::Media {
            src: attr("src"),
            alt: attr("alt"),
        },
        ComponentKind::Footer => ComponentDetails::Footer {
            links: count_within(element, "a"),
        },
        ComponentKind::Sidebar => ComponentDetails::Sidebar {
            widgets: descendants(element, "div, section")
                .filter(|e| {
                    e.value()
                        .attr("class")
                        .map(|c| patterns::WIDGET_CLASS.is_match(c))
                        .unwrap_or(false)
                })
                .count(),
        },
        ComponentKind::Modal => ComponentDetails::Modal {
            buttons: count_within(element, "button, input"),
        },
        ComponentKind::Button => ComponentDetails::Button {
            kind: attr("type"),
            href: attr("href"),
        },
        ComponentKind::Breadcrumb => ComponentDetails::Items {
            items: count_within(element, "li, a"),
        },
    }
}

/// Descendants of `element` matching `selector`, excluding the element itself
fn descendants<'a>(
    element: ElementRef<'a>,
    selector: &str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    let parsed = Selector::parse(selector).ok();
    let own_id = element.id();
    parsed
        .into_iter()
        .flat_map(move |selector| element.select(&selector).collect::<Vec<_>>())
        .filter(move |e| e.id() != own_id)
}

fn count_within(element: ElementRef<'_>, selector: &str) -> usize {
    descendants(element, selector).count()
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
