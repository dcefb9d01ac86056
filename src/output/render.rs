//! Standalone HTML pages for browsing extracted components
//!
//! Component markup is embedded as-is; every piece of metadata around it is
//! escaped with `html-escape`.

use crate::components::ComponentRecord;
use crate::output::page_writer::ComponentIndex;
use html_escape::{encode_double_quoted_attribute, encode_text};

/// Characters of the text preview shown above a component
const PAGE_PREVIEW_CHARS: usize = 100;

const COMPONENT_STYLE: &str = "\
        body { font-family: Arial, sans-serif; margin: 20px; }
        .component-info { background: #f5f5f5; padding: 10px; margin-bottom: 20px; border-radius: 5px; }
        .component-content { border: 1px solid #ddd; padding: 10px; border-radius: 5px; }
";

const INDEX_STYLE: &str = "\
        body { font-family: Arial, sans-serif; margin: 20px; background: #f5f5f5; }
        .header { background: #333; color: white; padding: 20px; border-radius: 5px; margin-bottom: 20px; }
        .component-type { background: white; margin: 10px 0; padding: 15px; border-radius: 5px; }
        .component-list { display: grid; grid-template-columns: repeat(auto-fill, minmax(200px, 1fr)); gap: 10px; }
        .component-item { background: #f9f9f9; padding: 10px; border-radius: 3px; border-left: 4px solid #007cba; }
        .component-item a { text-decoration: none; color: #007cba; font-weight: bold; }
        .stats { background: #e7f3ff; padding: 10px; border-radius: 5px; margin-bottom: 20px; }
";

/// Wraps one component's markup in a complete HTML document
pub fn component_page(record: &ComponentRecord) -> String {
    let title = record.kind.title();
    let preview: String = record.text_preview.chars().take(PAGE_PREVIEW_CHARS).collect();

    let mut html = String::new();
    html.push_str(&head(
        &format!("{} Component - {}", title, record.id),
        COMPONENT_STYLE,
    ));
    html.push_str("<body>\n    <div class=\"component-info\">\n");
    html.push_str(&format!("        <h2>{} Component</h2>\n", encode_text(&title)));
    html.push_str(&format!(
        "        <p><strong>ID:</strong> {}</p>\n",
        encode_text(&record.id)
    ));
    html.push_str(&format!(
        "        <p><strong>Tag:</strong> {}</p>\n",
        encode_text(&record.tag)
    ));
    html.push_str(&format!(
        "        <p><strong>Classes:</strong> {}</p>\n",
        encode_text(&record.classes.join(", "))
    ));
    html.push_str(&format!(
        "        <p><strong>Text Preview:</strong> {}...</p>\n",
        encode_text(&preview)
    ));
    html.push_str("    </div>\n    <div class=\"component-content\">\n");
    html.push_str(&record.html);
    html.push_str("\n    </div>\n</body>\n</html>\n");

    html
}

/// Index page linking every component file of one page
pub fn component_index_page(page_id: &str, index: &ComponentIndex) -> String {
    let mut html = String::new();
    html.push_str(&head(&format!("Component Index - {}", page_id), INDEX_STYLE));
    html.push_str("<body>\n    <div class=\"header\">\n        <h1>Component Index</h1>\n");
    html.push_str(&format!("        <p>Page: {}</p>\n", encode_text(page_id)));
    html.push_str(&format!(
        "        <p>Extracted: {}</p>\n    </div>\n",
        encode_text(&index.extraction_timestamp)
    ));

    html.push_str("    <div class=\"stats\">\n        <h2>Summary</h2>\n");
    html.push_str(&format!(
        "        <p><strong>Total Components:</strong> {}</p>\n",
        index.total_components
    ));
    html.push_str(&format!(
        "        <p><strong>Component Types:</strong> {}</p>\n    </div>\n",
        index.component_types.len()
    ));

    for (directory, entry) in &index.component_types {
        html.push_str("    <div class=\"component-type\">\n");
        html.push_str(&format!(
            "        <h3>{} ({} components)</h3>\n        <div class=\"component-list\">\n",
            encode_text(&entry.title),
            entry.count
        ));
        for file in &entry.files {
            let id = file.trim_end_matches(".html");
            let href = format!("components/{}/{}", directory, file);
            html.push_str(&format!(
                "            <div class=\"component-item\"><a href=\"{}\" target=\"_blank\">{}</a></div>\n",
                encode_double_quoted_attribute(&href),
                encode_text(id)
            ));
        }
        html.push_str("        </div>\n    </div>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn head(title: &str, style: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n    <meta charset=\"UTF-8\">\n    \
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n    \
         <title>{}</title>\n    <style>\n{}    </style>\n</head>\n",
        encode_text(title),
        style
    )
}
