//! Output layer: HTML reports and SVG figures.

pub mod html;
pub mod svg;

pub use html::render_html_report;
pub use svg::render_figure_svg;

/// Escape text for HTML element content and attribute values (also valid XML).
pub fn escape_markup(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
