//! Figure layer: the weighted graph drawn by `draw`.

pub mod spec;

pub use spec::{Figure, FigureSpec};
