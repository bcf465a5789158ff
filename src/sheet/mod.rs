//! Parsed sprite-sheet model and SVG re-serialization.

pub mod document;
pub mod writer;
