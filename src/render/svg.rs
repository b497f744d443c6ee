use crate::Result;
use crate::figure::Figure;
use crate::render::escape_markup;

use std::fmt::Write;

const BACKGROUND: &str = "#e2eedd";
const EDGE_STROKE: &str = "#d59f0d";
const EDGE_WIDTH: u32 = 10;
const VERTEX_STROKE: &str = "#002f6c";
const VERTEX_RADIUS: u32 = 24;

/// Text anchors sit left of and below the point they label.
const TEXT_DX: f64 = -5.0;
const TEXT_DY: f64 = 5.0;

/// Render a figure as a standalone SVG document.
///
/// Edges (with their weights at the midpoint) are drawn first so the vertex
/// circles cover the line ends.
pub fn render_figure_svg(figure: &Figure) -> Result<String> {
    let mut out = String::new();
    write_svg(&mut out, figure)?;
    Ok(out)
}

fn write_svg(out: &mut String, figure: &Figure) -> std::fmt::Result {
    writeln!(out, r#"<?xml version="1.0" encoding="utf-8" ?>"#)?;
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="{w}" height="{h}">"#,
        w = figure.width,
        h = figure.height
    )?;
    writeln!(
        out,
        r#"  <rect x="0" y="0" width="{}" height="{}" fill="{}" />"#,
        figure.width, figure.height, BACKGROUND
    )?;

    for edge in &figure.edges {
        let a = &figure.vertices[edge.from];
        let b = &figure.vertices[edge.to];
        writeln!(
            out,
            r#"  <line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}" />"#,
            a.x, a.y, b.x, b.y, EDGE_STROKE, EDGE_WIDTH
        )?;
        let mid_x = 0.5 * (a.x + b.x);
        let mid_y = 0.5 * (a.y + b.y);
        writeln!(
            out,
            r#"  <text x="{}" y="{}" font-size="16" font-family="Arial" style="text-shadow: 0 0 5px #fff;">{}</text>"#,
            mid_x + TEXT_DX,
            mid_y + TEXT_DY,
            edge.weight
        )?;
    }

    for v in &figure.vertices {
        writeln!(
            out,
            r#"  <circle cx="{}" cy="{}" r="{}" stroke="{}" fill="white" />"#,
            v.x, v.y, VERTEX_RADIUS, VERTEX_STROKE
        )?;
        writeln!(
            out,
            r#"  <text x="{}" y="{}" font-size="14" font-family="Arial">{}</text>"#,
            v.x + TEXT_DX,
            v.y + TEXT_DY,
            escape_markup(&v.label)
        )?;
    }

    writeln!(out, "</svg>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::FigureSpec;
    use pretty_assertions::assert_eq;

    #[test]
    fn example_has_every_shape() {
        let fig = FigureSpec::example().validate_and_build().unwrap();
        let svg = render_figure_svg(&fig).unwrap();

        assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n<svg "));
        assert!(svg.ends_with("</svg>\n"));
        assert_eq!(svg.matches("<line ").count(), 19);
        assert_eq!(svg.matches("<circle ").count(), 16);
        assert_eq!(svg.matches("<text ").count(), 19 + 16);
    }

    #[test]
    fn weight_sits_at_edge_midpoint() {
        let fig = FigureSpec::example().validate_and_build().unwrap();
        let svg = render_figure_svg(&fig).unwrap();
        // IM: I(50, 46) - M(177, 40), midpoint (113.5, 43)
        assert!(svg.contains(
            r##"<line x1="50" y1="46" x2="177" y2="40" stroke="#d59f0d" stroke-width="10" />"##
        ));
        assert!(svg.contains(r#"<text x="108.5" y="48" font-size="16" font-family="Arial" style="text-shadow: 0 0 5px #fff;">6</text>"#));
        assert!(svg.contains(r#"<text x="440" y="343" font-size="14" font-family="Arial">A</text>"#));
    }

    #[test]
    fn edges_are_drawn_before_vertices() {
        let fig = FigureSpec::example().validate_and_build().unwrap();
        let svg = render_figure_svg(&fig).unwrap();
        let last_line = svg.rfind("<line ").unwrap();
        let first_circle = svg.find("<circle ").unwrap();
        assert!(last_line < first_circle);
    }
}
