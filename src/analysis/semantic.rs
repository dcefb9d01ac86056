use crate::analysis::dom::{self, HEADINGS};
use crate::analysis::{to_metrics, AnalysisError, AnalysisStrategy};
use scraper::Html;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use url::Url;

const SEMANTIC_TAGS: &[&str] = &[
    "header",
    "nav",
    "main",
    "section",
    "article",
    "aside",
    "footer",
    "figure",
    "figcaption",
];

const SAMPLES_PER_TAG: usize = 3;
const SAMPLE_TEXT_CHARS: usize = 200;

/// HTML5 landmarks, heading outline, microdata and social metadata
pub struct SemanticAnalysis;

#[derive(Debug, Serialize)]
struct SemanticReport {
    html5_semantic_tags: BTreeMap<&'static str, TagUsage>,
    heading_structure: HeadingStructure,
    content_sections: ContentSections,
    microdata: BTreeMap<String, Vec<BTreeMap<String, String>>>,
    schema_org: Vec<String>,
    open_graph: BTreeMap<String, String>,
    twitter_cards: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
struct TagUsage {
    count: usize,
    content: Vec<TagSample>,
}

#[derive(Debug, Serialize)]
struct TagSample {
    text: String,
    classes: Vec<String>,
}

#[derive(Debug, Serialize)]
struct HeadingStructure {
    hierarchy: Vec<Heading>,
    h1_count: usize,
    total_headings: usize,
}

#[derive(Debug, Serialize)]
struct Heading {
    level: String,
    text: String,
    id: String,
    classes: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ContentSections {
    sections: Vec<SectionInfo>,
    articles: Vec<SectionInfo>,
}

#[derive(Debug, Serialize)]
struct SectionInfo {
    id: String,
    classes: Vec<String>,
    text_length: usize,
}

impl AnalysisStrategy for SemanticAnalysis {
    fn name(&self) -> &'static str {
        "semantic"
    }

    fn analyze(&self, document: &Html, _url: &Url) -> Result<Value, AnalysisError> {
        let mut html5_semantic_tags = BTreeMap::new();
        for tag in SEMANTIC_TAGS {
            let elements = dom::select(document, tag)?;
            let content = elements
                .iter()
                .take(SAMPLES_PER_TAG)
                .map(|e| TagSample {
                    text: dom::text_preview(*e, SAMPLE_TEXT_CHARS),
                    classes: dom::classes(*e),
                })
                .collect();
            html5_semantic_tags.insert(
                *tag,
                TagUsage {
                    count: elements.len(),
                    content,
                },
            );
        }

        let headings = dom::select(document, HEADINGS)?;
        let heading_structure = HeadingStructure {
            hierarchy: headings
                .iter()
                .map(|h| Heading {
                    level: h.value().name().to_string(),
                    text: dom::text(*h).trim().to_string(),
                    id: dom::attr_or_empty(*h, "id"),
                    classes: dom::classes(*h),
                })
                .collect(),
            h1_count: dom::count(document, "h1")?,
            total_headings: headings.len(),
        };

        let section_info = |tag: &str| -> Result<Vec<SectionInfo>, AnalysisError> {
            Ok(dom::select(document, tag)?
                .into_iter()
                .map(|e| SectionInfo {
                    id: dom::attr_or_empty(e, "id"),
                    classes: dom::classes(e),
                    text_length: dom::text(e).chars().count(),
                })
                .collect())
        };
        let content_sections = ContentSections {
            sections: section_info("section")?,
            articles: section_info("article")?,
        };

        let report = SemanticReport {
            html5_semantic_tags,
            heading_structure,
            content_sections,
            microdata: microdata(document)?,
            schema_org: json_ld_types(document)?,
            open_graph: meta_pairs(document, r#"meta[property^="og:"]"#, "property")?,
            twitter_cards: meta_pairs(document, r#"meta[name^="twitter:"]"#, "name")?,
        };

        to_metrics(&report)
    }
}

/// Properties of every `itemscope` element, grouped by item type
fn microdata(document: &Html) -> Result<BTreeMap<String, Vec<BTreeMap<String, String>>>, AnalysisError> {
    let mut items: BTreeMap<String, Vec<BTreeMap<String, String>>> = BTreeMap::new();

    for item in dom::select(document, "[itemscope]")? {
        let item_type = dom::attr(item, "itemtype").unwrap_or("unknown").to_string();

        let mut properties = BTreeMap::new();
        for prop in dom::select_within(item, "[itemprop]")? {
            let Some(name) = dom::attr(prop, "itemprop") else {
                continue;
            };
            let text = dom::text(prop);
            let value = match text.trim() {
                "" => dom::attr_or_empty(prop, "content"),
                trimmed => trimmed.to_string(),
            };
            properties.insert(name.to_string(), value);
        }

        items.entry(item_type).or_default().push(properties);
    }

    Ok(items)
}

/// `@type` values declared in JSON-LD blocks, first occurrence order
pub(crate) fn json_ld_types(document: &Html) -> Result<Vec<String>, AnalysisError> {
    let mut types = Vec::new();

    for script in dom::select(document, r#"script[type="application/ld+json"]"#)? {
        match serde_json::from_str::<Value>(&dom::text(script)) {
            Ok(value) => collect_types(&value, &mut types),
            Err(e) => tracing::debug!("Skipping malformed JSON-LD block: {}", e),
        }
    }

    Ok(types)
}

fn collect_types(value: &Value, types: &mut Vec<String>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| collect_types(item, types)),
        Value::Object(map) => {
            match map.get("@type") {
                Some(Value::String(t)) => push_unique(types, t),
                Some(Value::Array(ts)) => ts
                    .iter()
                    .filter_map(Value::as_str)
                    .for_each(|t| push_unique(types, t)),
                _ => {}
            }
            if let Some(graph) = map.get("@graph") {
                collect_types(graph, types);
            }
        }
        _ => {}
    }
}

fn push_unique(types: &mut Vec<String>, t: &str) {
    if !types.iter().any(|existing| existing == t) {
        types.push(t.to_string());
    }
}

fn meta_pairs(
    document: &Html,
    css: &str,
    key_attr: &str,
) -> Result<BTreeMap<String, String>, AnalysisError> {
    Ok(dom::select(document, css)?
        .into_iter()
        .map(|meta| (dom::attr_or_empty(meta, key_attr), dom::attr_or_empty(meta, "content")))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(html: &str) -> Value {
        SemanticAnalysis
            .analyze(
                &Html::parse_document(html),
                &Url::parse("https://example.com/").unwrap(),
            )
            .unwrap()
    }

    #[test]
    fn test_semantic_tags_and_samples() {
        let sections: String = (0..5)
            .map(|i| format!(r#"<section class="s{}">Section {}</section>"#, i, i))
            .collect();
        let metrics = analyze(&format!("<body><nav>Menu</nav>{}</body>", sections));

        assert_eq!(metrics["html5_semantic_tags"]["section"]["count"], 5);
        assert_eq!(
            metrics["html5_semantic_tags"]["section"]["content"]
                .as_array()
                .unwrap()
                .len(),
            3
        );
        assert_eq!(metrics["html5_semantic_tags"]["nav"]["content"][0]["text"], "Menu");
        assert_eq!(metrics["html5_semantic_tags"]["aside"]["count"], 0);
        assert_eq!(metrics["content_sections"]["sections"][0]["text_length"], 9);
    }

    #[test]
    fn test_heading_hierarchy() {
        let metrics = analyze(r#"<h1 id="top"> Title </h1><h2 class="sub">Sub</h2><h1>Again</h1>"#);
        let structure = &metrics["heading_structure"];
        assert_eq!(structure["h1_count"], 2);
        assert_eq!(structure["total_headings"], 3);
        assert_eq!(structure["hierarchy"][0]["level"], "h1");
        assert_eq!(structure["hierarchy"][0]["text"], "Title");
        assert_eq!(structure["hierarchy"][0]["id"], "top");
        assert_eq!(structure["hierarchy"][1]["classes"][0], "sub");
    }

    #[test]
    fn test_microdata_grouped_by_type() {
        let metrics = analyze(
            r#"<div itemscope itemtype="https://schema.org/Product">
                 <span itemprop="name">Lamp</span>
                 <meta itemprop="price" content="19.99">
               </div>
               <div itemscope><span itemprop="label">X</span></div>"#,
        );
        let product = &metrics["microdata"]["https://schema.org/Product"][0];
        assert_eq!(product["name"], "Lamp");
        assert_eq!(product["price"], "19.99");
        assert_eq!(metrics["microdata"]["unknown"][0]["label"], "X");
    }

    #[test]
    fn test_json_ld_types() {
        let metrics = analyze(
            r#"<script type="application/ld+json">
                {"@context": "https://schema.org", "@graph": [{"@type": "Organization"}, {"@type": ["WebSite", "Organization"]}]}
               </script>
               <script type="application/ld+json">{ not json</script>"#,
        );
        assert_eq!(
            metrics["schema_org"],
            serde_json::json!(["Organization", "WebSite"])
        );
    }

    #[test]
    fn test_open_graph_and_twitter() {
        let metrics = analyze(
            r#"<head><meta property="og:title" content="OG Title">
               <meta name="twitter:card" content="summary"></head>"#,
        );
        assert_eq!(metrics["open_graph"]["og:title"], "OG Title");
        assert_eq!(metrics["twitter_cards"]["twitter:card"], "summary");
    }
}
