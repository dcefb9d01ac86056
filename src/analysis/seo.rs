use crate::analysis::dom::{self, HEADINGS};
use crate::analysis::semantic::json_ld_types;
use crate::analysis::{to_metrics, AnalysisError, AnalysisStrategy};
use scraper::Html;
use serde::Serialize;
use serde_json::Value;
use url::Url;

/// Search-engine facing metadata, headings, alt coverage and link hygiene
pub struct SeoAnalysis;

#[derive(Debug, Serialize)]
struct SeoReport {
    meta_tags: MetaTags,
    heading_structure: HeadingStructure,
    content_optimization: ContentOptimization,
    technical_seo: TechnicalSeo,
}

#[derive(Debug, Serialize)]
struct MetaTags {
    title: MetaValue,
    description: MetaValue,
    keywords: MetaValue,
    canonical: MetaValue,
}

#[derive(Debug, Serialize)]
struct MetaValue {
    exists: bool,
    content: String,
    length: usize,
}

impl MetaValue {
    fn new(content: Option<String>) -> Self {
        let exists = content.is_some();
        let content = content.unwrap_or_default();
        Self {
            exists,
            length: content.chars().count(),
            content,
        }
    }
}

#[derive(Debug, Serialize)]
struct HeadingStructure {
    h1_count: usize,
    h1_content: Vec<String>,
    heading_hierarchy: Vec<String>,
    total_headings: usize,
}

#[derive(Debug, Serialize)]
struct ContentOptimization {
    images_with_alt: usize,
    images_without_alt: usize,
    internal_links: usize,
    external_links: usize,
    nofollow_links: usize,
}

#[derive(Debug, Serialize)]
struct TechnicalSeo {
    structured_data_count: usize,
    json_ld_count: usize,
    json_ld_types: Vec<String>,
    robots_meta: Option<String>,
    lang: Option<String>,
}

impl AnalysisStrategy for SeoAnalysis {
    fn name(&self) -> &'static str {
        "seo"
    }

    fn analyze(&self, document: &Html, url: &Url) -> Result<Value, AnalysisError> {
        let first_attr = |css: &str, name: &str| -> Result<Option<String>, AnalysisError> {
            Ok(dom::select(document, css)?
                .first()
                .map(|e| dom::attr_or_empty(*e, name)))
        };

        let title = dom::select(document, "title")?
            .first()
            .map(|t| dom::text(*t).trim().to_string());

        let meta_tags = MetaTags {
            title: MetaValue::new(title),
            description: MetaValue::new(first_attr(r#"meta[name="description"]"#, "content")?),
            keywords: MetaValue::new(first_attr(r#"meta[name="keywords"]"#, "content")?),
            canonical: MetaValue::new(first_attr(r#"link[rel="canonical"]"#, "href")?),
        };

        let h1s = dom::select(document, "h1")?;
        let headings = dom::select(document, HEADINGS)?;
        let heading_structure = HeadingStructure {
            h1_count: h1s.len(),
            h1_content: h1s.iter().map(|h| dom::text(*h).trim().to_string()).collect(),
            heading_hierarchy: headings
                .iter()
                .map(|h| h.value().name().to_string())
                .collect(),
            total_headings: headings.len(),
        };

        let images = dom::select(document, "img")?;
        let images_with_alt = images
            .iter()
            .filter(|img| dom::attr(**img, "alt").is_some())
            .count();

        let links = dom::select(document, "a[href]")?;
        let hrefs: Vec<&str> = links.iter().filter_map(|a| dom::attr(*a, "href")).collect();
        let external_links = hrefs.iter().filter(|h| dom::is_external(h, url)).count();

        let content_optimization = ContentOptimization {
            images_with_alt,
            images_without_alt: images.len() - images_with_alt,
            internal_links: hrefs.len() - external_links,
            external_links,
            nofollow_links: links
                .iter()
                .filter(|a| dom::attr(**a, "rel").map_or(false, |rel| rel.contains("nofollow")))
                .count(),
        };

        let technical_seo = TechnicalSeo {
            structured_data_count: dom::count(document, "[itemscope]")?,
            json_ld_count: dom::count(document, r#"script[type="application/ld+json"]"#)?,
            json_ld_types: json_ld_types(document)?,
            robots_meta: first_attr(r#"meta[name="robots"]"#, "content")?,
            lang: dom::attr(document.root_element(), "lang").map(str::to_string),
        };

        to_metrics(&SeoReport {
            meta_tags,
            heading_structure,
            content_optimization,
            technical_seo,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(html: &str) -> Value {
        SeoAnalysis
            .analyze(
                &Html::parse_document(html),
                &Url::parse("https://example.com/").unwrap(),
            )
            .unwrap()
    }

    #[test]
    fn test_meta_tags() {
        let metrics = analyze(
            r#"<html lang="en"><head><title> Shop </title>
               <meta name="description" content="Lamps and more">
               <link rel="canonical" href="https://example.com/shop">
               <meta name="robots" content="noindex"></head><body></body></html>"#,
        );
        let meta = &metrics["meta_tags"];
        assert_eq!(meta["title"]["content"], "Shop");
        assert_eq!(meta["title"]["length"], 4);
        assert_eq!(meta["description"]["exists"], true);
        assert_eq!(meta["keywords"]["exists"], false);
        assert_eq!(meta["keywords"]["content"], "");
        assert_eq!(meta["canonical"]["content"], "https://example.com/shop");
        assert_eq!(metrics["technical_seo"]["robots_meta"], "noindex");
        assert_eq!(metrics["technical_seo"]["lang"], "en");
    }

    #[test]
    fn test_headings_and_alt_coverage() {
        let metrics = analyze(
            r#"<h1>Main</h1><h3>Deep</h3><h2>Sub</h2>
               <img src="a.png" alt="A"><img src="b.png" alt=""><img src="c.png">"#,
        );
        let headings = &metrics["heading_structure"];
        assert_eq!(headings["h1_content"], serde_json::json!(["Main"]));
        assert_eq!(headings["heading_hierarchy"], serde_json::json!(["h1", "h3", "h2"]));
        assert_eq!(metrics["content_optimization"]["images_with_alt"], 2);
        assert_eq!(metrics["content_optimization"]["images_without_alt"], 1);
    }

    #[test]
    fn test_link_classification() {
        let metrics = analyze(
            r#"<a href="/about">About</a>
               <a href="https://partner.org/" rel="nofollow noopener">Partner</a>
               <a href="https://example.com/contact">Contact</a>"#,
        );
        let content = &metrics["content_optimization"];
        assert_eq!(content["internal_links"], 2);
        assert_eq!(content["external_links"], 1);
        assert_eq!(content["nofollow_links"], 1);
    }

    #[test]
    fn test_structured_data() {
        let metrics = analyze(
            r#"<div itemscope itemtype="https://schema.org/Event"></div>
               <script type="application/ld+json">{"@type": "Event"}</script>"#,
        );
        let technical = &metrics["technical_seo"];
        assert_eq!(technical["structured_data_count"], 1);
        assert_eq!(technical["json_ld_count"], 1);
        assert_eq!(technical["json_ld_types"][0], "Event");
        assert!(technical["lang"].is_null());
    }
}
