use crate::analysis::dom::{self, Tally, HEADINGS};
use crate::analysis::{to_metrics, AnalysisError, AnalysisStrategy};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use serde::Serialize;
use serde_json::Value;
use url::Url;

static BREADCRUMB_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)breadcrumb").expect("Invalid breadcrumb regex"));
static MENU_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)menu|nav").expect("Invalid menu regex"));

/// What the page is made of: text, media, forms, links, data, navigation
pub struct ContentTypeAnalysis;

#[derive(Debug, Serialize)]
struct ContentReport {
    text_content: TextContent,
    media_content: MediaContent,
    interactive_content: InteractiveContent,
    data_content: DataContent,
    navigation_content: NavigationContent,
}

#[derive(Debug, Serialize)]
struct TextContent {
    paragraphs: Paragraphs,
    headings: Headings,
    lists: Lists,
}

#[derive(Debug, Serialize)]
struct Paragraphs {
    count: usize,
    avg_length: f64,
    total_words: usize,
}

#[derive(Debug, Serialize)]
struct Headings {
    count: usize,
    distribution: Vec<Tally>,
}

#[derive(Debug, Serialize)]
struct Lists {
    count: usize,
    types: Vec<Tally>,
    total_items: usize,
}

#[derive(Debug, Serialize)]
struct MediaContent {
    images: Images,
    videos: Videos,
    audio: Audio,
}

#[derive(Debug, Serialize)]
struct Images {
    count: usize,
    with_alt: usize,
    lazy_loaded: usize,
    formats: Vec<Tally>,
}

#[derive(Debug, Serialize)]
struct Videos {
    count: usize,
    embedded: usize,
    native: usize,
}

#[derive(Debug, Serialize)]
struct Audio {
    count: usize,
}

#[derive(Debug, Serialize)]
struct InteractiveContent {
    forms: Forms,
    buttons: Buttons,
    links: Links,
}

#[derive(Debug, Serialize)]
struct Forms {
    count: usize,
    methods: Vec<Tally>,
    total_inputs: usize,
}

#[derive(Debug, Serialize)]
struct Buttons {
    count: usize,
    types: Vec<Tally>,
}

#[derive(Debug, Serialize)]
struct Links {
    count: usize,
    external: usize,
    internal: usize,
}

#[derive(Debug, Serialize)]
struct DataContent {
    tables: Tables,
    structured_lists: StructuredLists,
}

#[derive(Debug, Serialize)]
struct Tables {
    count: usize,
    with_headers: usize,
    total_cells: usize,
}

#[derive(Debug, Serialize)]
struct StructuredLists {
    count: usize,
    definition_lists: usize,
}

#[derive(Debug, Serialize)]
struct NavigationContent {
    nav_elements: usize,
    breadcrumbs: usize,
    menu_lists: usize,
    skip_links: usize,
}

impl AnalysisStrategy for ContentTypeAnalysis {
    fn name(&self) -> &'static str {
        "content_type"
    }

    fn analyze(&self, document: &Html, url: &Url) -> Result<Value, AnalysisError> {
        let report = ContentReport {
            text_content: text_content(document)?,
            media_content: media_content(document)?,
            interactive_content: interactive_content(document, url)?,
            data_content: data_content(document)?,
            navigation_content: navigation_content(document)?,
        };
        to_metrics(&report)
    }
}

fn text_content(document: &Html) -> Result<TextContent, AnalysisError> {
    let paragraphs: Vec<String> = dom::select(document, "p")?
        .into_iter()
        .map(dom::text)
        .collect();
    let total_chars: usize = paragraphs.iter().map(|p| p.chars().count()).sum();
    let avg_length = if paragraphs.is_empty() {
        0.0
    } else {
        total_chars as f64 / paragraphs.len() as f64
    };

    let headings = dom::select(document, HEADINGS)?;
    let lists = dom::select(document, "ul, ol")?;
    let mut total_items = 0;
    for list in &lists {
        total_items += dom::count_within(*list, "li")?;
    }

    Ok(TextContent {
        paragraphs: Paragraphs {
            count: paragraphs.len(),
            avg_length,
            total_words: paragraphs.iter().map(|p| p.split_whitespace().count()).sum(),
        },
        headings: Headings {
            count: headings.len(),
            distribution: dom::tally(headings.iter().map(|h| h.value().name())),
        },
        lists: Lists {
            count: lists.len(),
            types: dom::tally(lists.iter().map(|l| l.value().name())),
            total_items,
        },
    })
}

fn media_content(document: &Html) -> Result<MediaContent, AnalysisError> {
    let images = dom::select(document, "img")?;
    let videos = dom::select(document, "video, iframe")?;

    let with_alt = images
        .iter()
        .filter(|img| dom::attr(**img, "alt").map_or(false, |alt| !alt.is_empty()))
        .count();
    let lazy_loaded = images
        .iter()
        .filter(|img| {
            dom::attr(**img, "loading").map_or(false, |l| l.contains("lazy"))
                || dom::classes(**img).join(" ").contains("lazy")
        })
        .count();
    let formats = dom::tally(
        images
            .iter()
            .filter_map(|img| dom::attr(*img, "src"))
            .filter_map(|src| src.rsplit_once('.'))
            .map(|(_, ext)| ext.to_lowercase()),
    );

    Ok(MediaContent {
        images: Images {
            count: images.len(),
            with_alt,
            lazy_loaded,
            formats,
        },
        videos: Videos {
            count: videos.len(),
            embedded: videos.iter().filter(|v| v.value().name() == "iframe").count(),
            native: videos.iter().filter(|v| v.value().name() == "video").count(),
        },
        audio: Audio {
            count: dom::count(document, "audio")?,
        },
    })
}

fn interactive_content(document: &Html, url: &Url) -> Result<InteractiveContent, AnalysisError> {
    let forms = dom::select(document, "form")?;
    let mut total_inputs = 0;
    for form in &forms {
        total_inputs += dom::count_within(*form, "input, textarea, select")?;
    }

    let buttons = dom::select(document, "button, input")?;
    let links = dom::select(document, "a")?;
    let hrefs: Vec<&str> = links
        .iter()
        .filter_map(|a| dom::attr(*a, "href"))
        .filter(|href| !href.is_empty())
        .collect();
    let external = hrefs.iter().filter(|h| dom::is_external(h, url)).count();

    Ok(InteractiveContent {
        forms: Forms {
            count: forms.len(),
            methods: dom::tally(
                forms
                    .iter()
                    .map(|f| dom::attr(*f, "method").unwrap_or("get").to_lowercase()),
            ),
            total_inputs,
        },
        buttons: Buttons {
            count: buttons.len(),
            types: dom::tally(
                buttons
                    .iter()
                    .filter(|b| b.value().name() == "input")
                    .map(|b| dom::attr(*b, "type").unwrap_or("button")),
            ),
        },
        links: Links {
            count: links.len(),
            external,
            internal: hrefs.len() - external,
        },
    })
}

fn data_content(document: &Html) -> Result<DataContent, AnalysisError> {
    let tables = dom::select(document, "table")?;
    let mut with_headers = 0;
    let mut total_cells = 0;
    for table in &tables {
        if dom::count_within(*table, "th")? > 0 {
            with_headers += 1;
        }
        total_cells += dom::count_within(*table, "td, th")?;
    }

    let lists = dom::select(document, "dl, ul, ol")?;

    Ok(DataContent {
        tables: Tables {
            count: tables.len(),
            with_headers,
            total_cells,
        },
        structured_lists: StructuredLists {
            count: lists.len(),
            definition_lists: lists.iter().filter(|l| l.value().name() == "dl").count(),
        },
    })
}

fn navigation_content(document: &Html) -> Result<NavigationContent, AnalysisError> {
    let class_matches = |css: &str, pattern: &Regex| -> Result<usize, AnalysisError> {
        Ok(dom::select(document, css)?
            .into_iter()
            .filter(|e| dom::attr(*e, "class").map_or(false, |c| pattern.is_match(c)))
            .count())
    };

    Ok(NavigationContent {
        nav_elements: dom::count(document, "nav")?,
        breadcrumbs: class_matches("[class]", &*BREADCRUMB_CLASS)?,
        menu_lists: class_matches("ul, ol", &*MENU_CLASS)?,
        skip_links: dom::count(document, r##"a[href^="#"]"##)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(html: &str) -> Value {
        ContentTypeAnalysis
            .analyze(
                &Html::parse_document(html),
                &Url::parse("https://example.com/").unwrap(),
            )
            .unwrap()
    }

    #[test]
    fn test_paragraph_statistics() {
        let metrics = analyze("<p>one two</p><p>three four five six</p>");
        let p = &metrics["text_content"]["paragraphs"];
        assert_eq!(p["count"], 2);
        assert_eq!(p["total_words"], 6);
        assert_eq!(p["avg_length"], 13.0);
    }

    #[test]
    fn test_empty_page_has_zero_average() {
        let metrics = analyze("<body></body>");
        assert_eq!(metrics["text_content"]["paragraphs"]["avg_length"], 0.0);
    }

    #[test]
    fn test_image_signals() {
        let metrics = analyze(
            r#"<img src="/a.PNG" alt="A"><img src="/b.jpg" loading="lazy"><img class="lazyload" src="c"><img alt="">"#,
        );
        let images = &metrics["media_content"]["images"];
        assert_eq!(images["count"], 4);
        assert_eq!(images["with_alt"], 1);
        assert_eq!(images["lazy_loaded"], 2);
        assert_eq!(images["formats"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_links_split_internal_external() {
        let metrics = analyze(
            r#"<a href="/in">a</a><a href="https://example.com/x">b</a><a href="https://other.org/">c</a><a>d</a>"#,
        );
        let links = &metrics["interactive_content"]["links"];
        assert_eq!(links["count"], 4);
        assert_eq!(links["external"], 1);
        assert_eq!(links["internal"], 2);
    }

    #[test]
    fn test_forms_and_buttons() {
        let metrics = analyze(
            r#"<form method="POST"><input type="email"><input><textarea></textarea><button>Go</button></form>"#,
        );
        let interactive = &metrics["interactive_content"];
        assert_eq!(interactive["forms"]["methods"][0]["value"], "post");
        assert_eq!(interactive["forms"]["total_inputs"], 3);
        assert_eq!(interactive["buttons"]["count"], 3);
        assert_eq!(interactive["buttons"]["types"][0]["value"], "email");
        assert_eq!(interactive["buttons"]["types"][1]["value"], "button");
    }

    #[test]
    fn test_navigation_content() {
        let metrics = analyze(
            r##"<nav><ul class="main-menu"><li><a href="#skip">Skip</a></li></ul></nav>
               <ol class="Breadcrumb"><li>Home</li></ol>"##,
        );
        let nav = &metrics["navigation_content"];
        assert_eq!(nav["nav_elements"], 1);
        assert_eq!(nav["breadcrumbs"], 1);
        assert_eq!(nav["menu_lists"], 1);
        assert_eq!(nav["skip_links"], 1);
    }

    #[test]
    fn test_tables() {
        let metrics = analyze(
            "<table><tr><th>H</th></tr><tr><td>1</td></tr></table><table><tr><td>x</td></tr></table>",
        );
        let tables = &metrics["data_content"]["tables"];
        assert_eq!(tables["count"], 2);
        assert_eq!(tables["with_headers"], 1);
        assert_eq!(tables["total_cells"], 3);
    }
}
