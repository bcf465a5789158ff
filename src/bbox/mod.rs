//! Per-group bounding-box resolution.
//!
//! Two interchangeable strategies implement [`BBoxResolver`]: an analytic walk over transforms
//! and path data, and a raster pass that renders each group and scans its alpha channel.

mod analytic;
mod raster;

pub use analytic::{AnalyticResolver, MAX_USE_DEPTH, resolve_bbox};
pub use raster::{MAX_RASTER_DIM, RasterResolver, alpha_bbox, single_group_svg};

use crate::foundation::core::Rect;
use crate::foundation::error::PoseResult;
use crate::sheet::document::{SpriteSheet, TopGroup};

/// Strategy used to compute each top-level group's bounding box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BBoxStrategy {
    /// Render each group and scan its alpha channel.
    #[default]
    Raster,
    /// Walk transforms and path data; no rasterizer involved.
    Analytic,
    /// Analytic unless the sheet uses transforms or shapes the analytic walk cannot model.
    Auto,
}

/// Resolve the visible extent of one top-level group, in canvas units.
pub trait BBoxResolver: Send + Sync {
    fn resolve(&self, sheet: &SpriteSheet<'_, '_>, group: &TopGroup<'_, '_>)
    -> PoseResult<Option<Rect>>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Build the resolver for `strategy`, inspecting `sheet` when the choice is automatic.
pub fn create_resolver(
    strategy: BBoxStrategy,
    sheet: &SpriteSheet<'_, '_>,
    raster_scale: f64,
    alpha_threshold: u8,
) -> Box<dyn BBoxResolver> {
    let raster = || -> Box<dyn BBoxResolver> {
        Box::new(RasterResolver::new(raster_scale, alpha_threshold))
    };
    match strategy {
        BBoxStrategy::Raster => raster(),
        BBoxStrategy::Analytic => {
            for t in sheet.unsupported_transforms() {
                tracing::warn!(
                    kind = %t.kind,
                    element = %t.element,
                    id = t.id.as_deref().unwrap_or(""),
                    "analytic bbox ignores this transform; consider the raster strategy"
                );
            }
            for (index, element) in sheet.unmeasured_shapes() {
                tracing::warn!(
                    group = index,
                    %element,
                    "analytic bbox ignores this element; consider the raster strategy"
                );
            }
            Box::new(AnalyticResolver)
        }
        BBoxStrategy::Auto => {
            let transforms = sheet.unsupported_transforms().len();
            let shapes = sheet.unmeasured_shapes().len();
            if transforms == 0 && shapes == 0 {
                Box::new(AnalyticResolver)
            } else {
                tracing::info!(
                    transforms,
                    shapes,
                    "sheet has content the analytic walk cannot measure, resolving bboxes by raster"
                );
                raster()
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/bbox/mod.rs"]
mod tests;
