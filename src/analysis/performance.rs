use crate::analysis::dom::{self, Tally};
use crate::analysis::{to_metrics, AnalysisError, AnalysisStrategy};
use scraper::Html;
use serde::Serialize;
use serde_json::Value;
use url::Url;

/// Resource hints, lazy loading, asset minification and third-party weight
pub struct PerformanceAnalysis;

#[derive(Debug, Serialize)]
struct PerformanceReport {
    resource_hints: ResourceHints,
    lazy_loading: LazyLoading,
    optimization_indicators: OptimizationIndicators,
    third_party_resources: ThirdPartyResources,
}

#[derive(Debug, Serialize)]
struct ResourceHints {
    preload: usize,
    prefetch: usize,
    preconnect: usize,
    dns_prefetch: usize,
}

#[derive(Debug, Serialize)]
struct LazyLoading {
    native_lazy: usize,
    class_based_lazy: usize,
    total_images: usize,
}

#[derive(Debug, Serialize)]
struct OptimizationIndicators {
    minified_scripts: usize,
    minified_styles: usize,
    inline_scripts: usize,
    inline_styles: usize,
    total_scripts: usize,
    total_stylesheets: usize,
}

#[derive(Debug, Serialize)]
struct ThirdPartyResources {
    external_scripts: usize,
    external_styles: usize,
    external_domains: Vec<Tally>,
}

impl AnalysisStrategy for PerformanceAnalysis {
    fn name(&self) -> &'static str {
        "performance"
    }

    fn analyze(&self, document: &Html, url: &Url) -> Result<Value, AnalysisError> {
        let resource_hints = ResourceHints {
            preload: dom::count(document, r#"link[rel~="preload"]"#)?,
            prefetch: dom::count(document, r#"link[rel~="prefetch"]"#)?,
            preconnect: dom::count(document, r#"link[rel~="preconnect"]"#)?,
            dns_prefetch: dom::count(document, r#"link[rel~="dns-prefetch"]"#)?,
        };

        let images = dom::select(document, "img")?;
        let lazy_loading = LazyLoading {
            native_lazy: dom::count(document, r#"img[loading="lazy"]"#)?,
            class_based_lazy: images
                .iter()
                .filter(|img| dom::attr(**img, "class").map_or(false, |c| c.contains("lazy")))
                .count(),
            total_images: images.len(),
        };

        let optimization_indicators = OptimizationIndicators {
            minified_scripts: dom::count(document, r#"script[src*=".min.js"]"#)?,
            minified_styles: dom::count(document, r#"link[href*=".min.css"]"#)?,
            inline_scripts: dom::count(document, "script:not([src])")?,
            inline_styles: dom::count(document, "style")?,
            total_scripts: dom::count(document, "script")?,
            total_stylesheets: dom::count(document, r#"link[rel~="stylesheet"]"#)?,
        };

        let script_srcs: Vec<&str> = dom::select(document, "script[src]")?
            .into_iter()
            .filter_map(|s| dom::attr(s, "src"))
            .filter(|src| dom::is_external(src, url))
            .collect();
        let style_hrefs: Vec<&str> = dom::select(document, r#"link[rel~="stylesheet"][href]"#)?
            .into_iter()
            .filter_map(|l| dom::attr(l, "href"))
            .filter(|href| dom::is_external(href, url))
            .collect();

        let third_party_resources = ThirdPartyResources {
            external_scripts: script_srcs.len(),
            external_styles: style_hrefs.len(),
            external_domains: dom::tally(
                script_srcs
                    .iter()
                    .chain(style_hrefs.iter())
                    .map(|link| dom::link_netloc(link)),
            ),
        };

        to_metrics(&PerformanceReport {
            resource_hints,
            lazy_loading,
            optimization_indicators,
            third_party_resources,
        })
    }
}
