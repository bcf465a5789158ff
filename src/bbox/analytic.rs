use crate::foundation::core::{Affine, Rect, union_opt};
use crate::foundation::error::PoseResult;
use crate::geometry::path::bbox_of_path;
use crate::sheet::document::{ElementKind, SpriteSheet, TopGroup, href_id};
use crate::transform::affine::{compose, identity, parse_transform};

use super::BBoxResolver;

/// `<use>` chains deeper than this are cut off, which also stops reference cycles.
pub const MAX_USE_DEPTH: usize = 32;

/// Bounding box from transforms and path control points.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnalyticResolver;

impl BBoxResolver for AnalyticResolver {
    fn resolve(
        &self,
        sheet: &SpriteSheet<'_, '_>,
        group: &TopGroup<'_, '_>,
    ) -> PoseResult<Option<Rect>> {
        Ok(resolve_bbox(group.node, identity(), sheet))
    }

    fn name(&self) -> &'static str {
        "analytic"
    }
}

fn local_transform(node: roxmltree::Node<'_, '_>) -> Affine {
    node.attribute("transform")
        .map(parse_transform)
        .unwrap_or_else(identity)
}

/// Bounds of `node` in canvas space, given the accumulated transform of its parent.
///
/// Groups union their children, paths map their points, `<use>` elements recurse into the
/// referenced element. Every other element kind contributes nothing.
pub fn resolve_bbox(
    node: roxmltree::Node<'_, '_>,
    parent: Affine,
    sheet: &SpriteSheet<'_, '_>,
) -> Option<Rect> {
    resolve_at_depth(node, parent, sheet, 0)
}

fn resolve_at_depth(
    node: roxmltree::Node<'_, '_>,
    parent: Affine,
    sheet: &SpriteSheet<'_, '_>,
    depth: usize,
) -> Option<Rect> {
    match ElementKind::of(node) {
        ElementKind::Group => {
            let m = compose(parent, local_transform(node));
            node.children()
                .filter(|c| c.is_element())
                .map(|c| resolve_at_depth(c, m, sheet, depth))
                .fold(None, union_opt)
        }
        ElementKind::Path => {
            let d = node.attribute("d")?;
            bbox_of_path(d, compose(parent, local_transform(node)))
        }
        ElementKind::Use => {
            if depth >= MAX_USE_DEPTH {
                tracing::warn!(
                    id = node.attribute("id").unwrap_or(""),
                    "use chain too deep, possible reference cycle"
                );
                return None;
            }
            let Some(id) = href_id(node) else {
                tracing::debug!("use element without a local href");
                return None;
            };
            let Some(target) = sheet.lookup(id) else {
                tracing::debug!(id, "use target not found under <defs>");
                return None;
            };
            let x = node.attribute("x").and_then(|v| v.trim().parse::<f64>().ok());
            let y = node.attribute("y").and_then(|v| v.trim().parse::<f64>().ok());
            let placement = Affine::translate((x.unwrap_or(0.0), y.unwrap_or(0.0)));
            let m = compose(compose(parent, local_transform(node)), placement);
            resolve_at_depth(target, m, sheet, depth + 1)
        }
        ElementKind::Other => None,
    }
}
