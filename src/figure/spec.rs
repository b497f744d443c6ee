//! Figure spec (figure.json): a weighted, undirected example graph to draw.
//!
//! JSON shape:
//! {
//!   "width": 500,                      // optional, default 500
//!   "height": 400,                     // optional, default 400
//!   "vertices": [
//!     { "label": "A", "x": 445, "y": 338 },
//!     ...
//!   ],
//!   "edges": [
//!     ["IM", 6],                        // two one-character labels + weight
//!     { "from": "O", "to": "E", "weight": 4 },
//!     ...
//!   ]
//! }
//!
//! Vertex order is drawing order. We validate labels, resolve edge endpoints
//! to vertex indices and reject dangling edges.

use crate::Result;

use anyhow::{Context, bail};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

fn default_width() -> f64 {
    500.0
}

fn default_height() -> f64 {
    400.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct FigureSpec {
    #[serde(default = "default_width")]
    pub width: f64,

    #[serde(default = "default_height")]
    pub height: f64,

    #[serde(default)]
    pub vertices: Vec<RawVertex>,

    #[serde(default)]
    pub edges: Vec<EdgeRefSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawVertex {
    pub label: String,
    pub x: f64,
    pub y: f64,
}

/// Edge references in figure.json.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EdgeRefSpec {
    // Compact shape: ["IM", 6]
    Pair(String, f64),
    // Explicit shape: { "from": "I", "to": "M", "weight": 6 }
    Explicit { from: String, to: String, weight: f64 },
}

/// Validated figure ready for rendering.
#[derive(Debug, Clone)]
pub struct Figure {
    pub width: f64,
    pub height: f64,
    pub vertices: Vec<Vertex>,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub label: String,
    pub x: f64,
    pub y: f64,
}

/// Endpoints are indices into `Figure::vertices`.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub weight: f64,
}

impl FigureSpec {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read figure file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parse figure file {}", path.display()))
    }

    /// The 16-vertex graph used in the recording research notes.
    pub fn example() -> Self {
        const VERTICES: [(&str, f64, f64); 16] = [
            ("A", 445.0, 338.0),
            ("B", 312.0, 137.0),
            ("C", 68.0, 238.0),
            ("D", 63.0, 335.0),
            ("E", 443.0, 49.0),
            ("F", 185.0, 244.0),
            ("G", 61.0, 143.0),
            ("H", 187.0, 132.0),
            ("I", 50.0, 46.0),
            ("J", 306.0, 245.0),
            ("K", 193.0, 339.0),
            ("L", 437.0, 136.0),
            ("M", 177.0, 40.0),
            ("N", 310.0, 348.0),
            ("O", 305.0, 41.0),
            ("P", 443.0, 242.0),
        ];
        const EDGES: [(&str, f64); 19] = [
            ("IM", 6.0),
            ("MH", 8.0),
            ("OE", 4.0),
            ("OB", 9.0),
            ("OL", 15.0),
            ("GH", 4.0),
            ("GF", 10.0),
            ("HB", 11.0),
            ("HF", 6.0),
            ("HJ", 13.0),
            ("BL", 4.0),
            ("BP", 10.0),
            ("LP", 7.0),
            ("FJ", 12.0),
            ("JN", 10.0),
            ("PN", 7.0),
            ("KN", 3.0),
            ("NA", 6.0),
            ("CD", 2.0),
        ];

        FigureSpec {
            width: default_width(),
            height: default_height(),
            vertices: VERTICES
                .iter()
                .map(|&(label, x, y)| RawVertex {
                    label: label.to_string(),
                    x,
                    y,
                })
                .collect(),
            edges: EDGES
                .iter()
                .map(|&(pair, w)| EdgeRefSpec::Pair(pair.to_string(), w))
                .collect(),
        }
    }

    /// Check labels are unique and every edge endpoint exists.
    pub fn validate_and_build(&self) -> Result<Figure> {
        if self.vertices.is_empty() {
            bail!("figure contains no vertices");
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            bail!("figure canvas must be positive, got {}x{}", self.width, self.height);
        }

        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut vertices = Vec::with_capacity(self.vertices.len());
        for (i, raw) in self.vertices.iter().enumerate() {
            if raw.label.is_empty() {
                bail!("vertex #{} has an empty label", i);
            }
            if index.insert(raw.label.as_str(), i).is_some() {
                bail!("duplicate vertex label in figure: {}", raw.label);
            }
            vertices.push(Vertex {
                label: raw.label.clone(),
                x: raw.x,
                y: raw.y,
            });
        }

        let lookup = |label: &str| -> Result<usize> {
            match index.get(label) {
                Some(&i) => Ok(i),
                None => bail!("edge references unknown vertex: {}", label),
            }
        };

        let mut edges = Vec::with_capacity(self.edges.len());
        for edge in &self.edges {
            let (from, to, weight) = match edge {
                EdgeRefSpec::Pair(pair, weight) => {
                    let mut ends = pair.chars();
                    match (ends.next(), ends.next(), ends.next()) {
                        (Some(a), Some(b), None) => {
                            (lookup(&a.to_string())?, lookup(&b.to_string())?, *weight)
                        }
                        _ => bail!(
                            "edge {:?} must name exactly two one-character vertices",
                            pair
                        ),
                    }
                }
                EdgeRefSpec::Explicit { from, to, weight } => (lookup(from)?, lookup(to)?, *weight),
            };
            edges.push(Edge { from, to, weight });
        }

        Ok(Figure {
            width: self.width,
            height: self.height,
            vertices,
            edges,
        })
    }
}
