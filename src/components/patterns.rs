use crate::components::ComponentKind;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// How one component type is recognized and bounded
#[derive(Debug, Clone, Copy)]
pub struct ComponentPattern {
    pub kind: ComponentKind,

    /// Tags an element must have, in selector form
    pub tags: &'static [&'static str],

    /// Case-insensitive alternatives the class attribute must contain;
    /// `None` accepts any element with a matching tag
    pub class_pattern: Option<&'static str>,

    /// Records kept per page
    pub cap: usize,

    /// Characters kept in the text preview
    pub preview: usize,

    /// Whether the text is trimmed before the preview is cut
    pub trim_preview: bool,
}

impl ComponentPattern {
    const fn new(
        kind: ComponentKind,
        tags: &'static [&'static str],
        class_pattern: Option<&'static str>,
        cap: usize,
        preview: usize,
    ) -> Self {
        Self {
            kind,
            tags,
            class_pattern,
            cap,
            preview,
            trim_preview: false,
        }
    }

    const fn trimmed(self) -> Self {
        Self {
            trim_preview: true,
            ..self
        }
    }

    pub fn selector(&self) -> String {
        self.tags.join(", ")
    }

    /// Whether a class attribute satisfies the class pattern
    pub fn accepts_class(&self, class: Option<&str>) -> bool {
        match (self.class_pattern, CLASS_MATCHERS.get(&self.kind)) {
            (None, _) => true,
            (Some(_), Some(matcher)) => class.map(|c| matcher.is_match(c)).unwrap_or(false),
            (Some(_), None) => false,
        }
    }
}

/// The fourteen component types, in extraction order
pub const PATTERNS: [ComponentPattern; 14] = [
    ComponentPattern::new(
        ComponentKind::Header,
        &["header", "div"],
        Some("header|top-bar|navbar"),
        5,
        200,
    ),
    ComponentPattern::new(
        ComponentKind::Navigation,
        &["nav", "ul", "ol"],
        Some("nav|menu|navigation"),
        10,
        200,
    ),
    ComponentPattern::new(
        ComponentKind::MainContent,
        &["main", "div"],
        Some("main|content|body"),
        3,
        500,
    ),
    ComponentPattern::new(
        ComponentKind::Article,
        &["article", "div"],
        Some("article|post|blog|story|news"),
        10,
        300,
    ),
    ComponentPattern::new(
        ComponentKind::Card,
        &["div", "section"],
        Some("card|tile|item|box|panel"),
        15,
        200,
    ),
    ComponentPattern::new(ComponentKind::Form, &["form"], None, 10, 200),
    ComponentPattern::new(ComponentKind::Table, &["table"], None, 10, 300),
    ComponentPattern::new(ComponentKind::List, &["ul", "ol", "dl"], None, 10, 200),
    ComponentPattern::new(
        ComponentKind::Media,
        &["img", "video", "audio", "iframe", "figure"],
        None,
        10,
        100,
    ),
    ComponentPattern::new(
        ComponentKind::Footer,
        &["footer", "div"],
        Some("footer|bottom"),
        3,
        300,
    ),
    ComponentPattern::new(
        ComponentKind::Sidebar,
        &["aside", "div"],
        Some("sidebar|aside|secondary"),
        5,
        200,
    ),
    ComponentPattern::new(
        ComponentKind::Modal,
        &["div", "dialog"],
        Some("modal|dialog|popup|overlay"),
        5,
        200,
    ),
    ComponentPattern::new(
        ComponentKind::Button,
        &["button", "input", "a"],
        Some("btn|button"),
        20,
        50,
    )
    .trimmed(),
    ComponentPattern::new(
        ComponentKind::Breadcrumb,
        &["nav", "ol", "ul", "div"],
        Some("breadcrumb|crumb"),
        3,
        100,
    ),
];

static CLASS_MATCHERS: Lazy<HashMap<ComponentKind, Regex>> = Lazy::new(|| {
    PATTERNS
        .iter()
        .filter_map(|pattern| {
            let alternatives = pattern.class_pattern?;
            let regex = Regex::new(&format!("(?i){}", alternatives))
                .expect("Invalid component class pattern");
            Some((pattern.kind, regex))
        })
        .collect()
});

/// Class pattern for sidebar widgets
pub static WIDGET_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)widget|module").expect("Invalid widget class regex"));
