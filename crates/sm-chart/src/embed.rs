//! Standalone HTML pages that render chart documents with vega-embed.
//!
//! The pages pull vega, vega-lite and vega-embed from the jsDelivr CDN and
//! carry the documents inline, so they can be written to disk or handed to
//! a sandboxed iframe as `srcdoc`.

use crate::spec::ChartSpec;

const VEGA_SCRIPTS: [&str; 3] = [
    "https://cdn.jsdelivr.net/npm/vega@5",
    "https://cdn.jsdelivr.net/npm/vega-lite@5",
    "https://cdn.jsdelivr.net/npm/vega-embed@6",
];

/// A page rendering a single chart.
pub fn to_html(spec: &ChartSpec) -> Result<String, serde_json::Error> {
    dashboard_html(spec.title(), &[spec])
}

/// A page rendering `charts` top to bottom under a common heading.
pub fn dashboard_html(title: &str, charts: &[&ChartSpec]) -> Result<String, serde_json::Error> {
    let mut page = String::new();
    page.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    page.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    for src in VEGA_SCRIPTS {
        page.push_str(&format!("<script src=\"{src}\"></script>\n"));
    }
    page.push_str("</head>\n<body>\n");
    page.push_str(&format!("<h1>{}</h1>\n", escape_html(title)));

    for position in 0..charts.len() {
        page.push_str(&format!("<div id=\"chart-{position}\"></div>\n"));
    }

    page.push_str("<script>\n");
    for (position, chart) in charts.iter().enumerate() {
        let json = escape_script(&chart.to_json()?);
        page.push_str(&format!(
            "vegaEmbed(\"#chart-{position}\", {json}, {{\"actions\": false}}).catch(console.error);\n"
        ));
    }
    page.push_str("</script>\n</body>\n</html>\n");
    Ok(page)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Inline JSON must not open or close markup inside the surrounding
/// `<script>` element, so every `<` becomes its JSON escape.
fn escape_script(json: &str) -> String {
    json.replace('<', "\\u003c")
}
