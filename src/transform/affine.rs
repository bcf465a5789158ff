//! Affine transform helpers.
//!
//! Only `translate(tx[, ty])` and `matrix(a, b, c, d, e, f)` are modelled. `rotate`, `scale`,
//! `skewX` and `skewY` are recognised so callers can detect them, but they contribute nothing
//! to the parsed matrix; sheets that rely on them need the raster strategy.

use std::sync::OnceLock;

use regex::Regex;

use crate::foundation::core::{Affine, Point};

/// One entry of an SVG `transform` list.
#[derive(Clone, Debug, PartialEq)]
pub enum TransformOp {
    Translate { tx: f64, ty: f64 },
    Matrix([f64; 6]),
    /// A well-formed entry of a kind that is not modelled (`rotate`, `scale`, ...).
    Unsupported(String),
}

impl TransformOp {
    fn to_affine(&self) -> Option<Affine> {
        match self {
            Self::Translate { tx, ty } => Some(Affine::translate((*tx, *ty))),
            Self::Matrix(coeffs) => Some(Affine::new(*coeffs)),
            Self::Unsupported(_) => None,
        }
    }
}

#[inline]
pub fn identity() -> Affine {
    Affine::IDENTITY
}

/// `a ∘ b`: the map that applies `b` first, then `a`.
#[inline]
pub fn compose(a: Affine, b: Affine) -> Affine {
    a * b
}

#[inline]
pub fn apply(m: Affine, x: f64, y: f64) -> (f64, f64) {
    let p = m * Point::new(x, y);
    (p.x, p.y)
}

fn re_entry() -> &'static Regex {
    static ONCE: OnceLock<Regex> = OnceLock::new();
    ONCE.get_or_init(|| Regex::new(r"([A-Za-z]+)\s*\(([^)]*)\)").unwrap())
}

fn re_num() -> &'static Regex {
    static ONCE: OnceLock<Regex> = OnceLock::new();
    ONCE.get_or_init(|| {
        Regex::new(r"[-+]?(?:\d+\.\d*|\.\d+|\d+)(?:[eE][-+]?\d+)?").unwrap()
    })
}

fn numbers(args: &str) -> Vec<f64> {
    re_num()
        .find_iter(args)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect()
}

/// Split a `transform` attribute into its entries, in textual order.
///
/// Entries with too few numeric arguments and unknown function names are dropped.
pub fn parse_transform_ops(attr: &str) -> Vec<TransformOp> {
    let mut out = Vec::new();
    for caps in re_entry().captures_iter(attr) {
        let name = &caps[1];
        let args = numbers(&caps[2]);
        match name {
            "translate" => match args.as_slice() {
                [tx] => out.push(TransformOp::Translate { tx: *tx, ty: 0.0 }),
                [tx, ty, ..] => out.push(TransformOp::Translate { tx: *tx, ty: *ty }),
                [] => tracing::debug!(attr, "skipping translate() without arguments"),
            },
            "matrix" => {
                if let [a, b, c, d, e, f, ..] = args.as_slice() {
                    out.push(TransformOp::Matrix([*a, *b, *c, *d, *e, *f]));
                } else {
                    tracing::debug!(attr, found = args.len(), "skipping matrix() with < 6 numbers");
                }
            }
            "rotate" | "scale" | "skewX" | "skewY" => {
                out.push(TransformOp::Unsupported(name.to_string()));
            }
            other => tracing::debug!(attr, kind = other, "skipping unknown transform function"),
        }
    }
    out
}

/// Parse an SVG `transform` attribute into one matrix.
///
/// Entries are composed left to right onto the accumulator, so the rightmost entry is applied
/// to points first, matching SVG semantics. An attribute with no recognised entry yields the
/// identity.
pub fn parse_transform(attr: &str) -> Affine {
    let mut acc = identity();
    for op in parse_transform_ops(attr) {
        match op.to_affine() {
            Some(m) => acc = compose(acc, m),
            None => tracing::debug!(attr, ?op, "ignoring unsupported transform entry"),
        }
    }
    acc
}

/// Names of the unsupported transform kinds used by `attr`, in textual order.
pub fn unsupported_kinds(attr: &str) -> Vec<String> {
    parse_transform_ops(attr)
        .into_iter()
        .filter_map(|op| match op {
            TransformOp::Unsupported(kind) => Some(kind),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/transform/affine.rs"]
mod tests;
