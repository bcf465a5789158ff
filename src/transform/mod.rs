//! Affine transform parsing and composition for SVG `transform` attributes.

pub mod affine;
