//! Rendering of annotated text into display segments

mod segments;

pub use segments::{render, Segment, Segments};
