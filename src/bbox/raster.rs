use std::sync::Arc;

use crate::foundation::core::{CanvasSize, Rect};
use crate::foundation::error::{PoseError, PoseResult};
use crate::sheet::document::{SpriteSheet, TopGroup};
use crate::sheet::writer::{DocumentFrame, Namespaces, write_document};

use super::BBoxResolver;

/// Largest raster side the resolver will allocate.
pub const MAX_RASTER_DIM: u32 = 16_384;

/// Bounding box from the visible pixels of a rendered group.
#[derive(Clone)]
pub struct RasterResolver {
    scale: f64,
    alpha_threshold: u8,
    fontdb: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for RasterResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterResolver")
            .field("scale", &self.scale)
            .field("alpha_threshold", &self.alpha_threshold)
            .field("font_faces", &self.fontdb.len())
            .finish()
    }
}

impl RasterResolver {
    pub fn new(scale: f64, alpha_threshold: u8) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        Self {
            scale,
            alpha_threshold,
            fontdb: Arc::new(db),
        }
    }

    /// Render `svg` into a `width` x `height` premultiplied RGBA8 buffer, stretched to fit.
    pub fn render_premul(&self, svg: &str, width: u32, height: u32) -> PoseResult<Vec<u8>> {
        if width > MAX_RASTER_DIM || height > MAX_RASTER_DIM {
            return Err(PoseError::raster(format!(
                "raster size {width}x{height} exceeds {MAX_RASTER_DIM}x{MAX_RASTER_DIM}"
            )));
        }
        let opts = usvg::Options {
            fontdb: self.fontdb.clone(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(svg, &opts)
            .map_err(|e| PoseError::raster(format!("parse svg: {e}")))?;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| PoseError::raster("failed to allocate pixmap"))?;
        let sx = (width as f32) / tree.size().width();
        let sy = (height as f32) / tree.size().height();
        let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);
        resvg::render(&tree, xform, &mut pixmap.as_mut());
        Ok(pixmap.take())
    }

    /// Render `svg` at `canvas * scale` pixels and return the alpha-scanned bounds in canvas
    /// units, offset by the canvas origin.
    pub fn bbox_of_svg(&self, svg: &str, canvas: CanvasSize) -> PoseResult<Option<Rect>> {
        let width = raster_dim(canvas.width * self.scale)?;
        let height = raster_dim(canvas.height * self.scale)?;
        let rgba = self.render_premul(svg, width, height)?;
        Ok(alpha_bbox(&rgba, width, self.alpha_threshold)
            .map(|px| scale_rect(px, self.scale) + canvas.origin().to_vec2()))
    }
}

impl BBoxResolver for RasterResolver {
    fn resolve(
        &self,
        sheet: &SpriteSheet<'_, '_>,
        group: &TopGroup<'_, '_>,
    ) -> PoseResult<Option<Rect>> {
        let svg = single_group_svg(sheet, group);
        self.bbox_of_svg(&svg, sheet.canvas()).map_err(|e| match e {
            PoseError::Raster(msg) => PoseError::raster(format!("group #{}: {msg}", group.index)),
            other => other,
        })
    }

    fn name(&self) -> &'static str {
        "raster"
    }
}

fn raster_dim(v: f64) -> PoseResult<u32> {
    if !v.is_finite() || v < 1.0 {
        return Err(PoseError::raster(format!("invalid raster size {v}")));
    }
    let px = v as u32;
    if px > MAX_RASTER_DIM {
        return Err(PoseError::raster(format!(
            "raster side {px} exceeds {MAX_RASTER_DIM}"
        )));
    }
    Ok(px)
}

fn scale_rect(px: Rect, scale: f64) -> Rect {
    Rect::new(px.x0 / scale, px.y0 / scale, px.x1 / scale, px.y1 / scale)
}

/// Wrap one group, plus the sheet's shared resources, into a full-canvas document.
pub fn single_group_svg(sheet: &SpriteSheet<'_, '_>, group: &TopGroup<'_, '_>) -> String {
    let canvas = sheet.canvas();
    let mut ns = Namespaces::from_root(sheet.root());
    ns.absorb(group.node);
    write_document(
        DocumentFrame {
            view_box: canvas.to_rect(),
            width: canvas.width.trunc().max(1.0),
            height: canvas.height.trunc().max(1.0),
            wrap_group: false,
        },
        &ns,
        sheet.shared(),
        [group.node],
    )
}

/// Pixel-space bounds of RGBA8 pixels whose alpha exceeds `threshold`.
///
/// The returned rectangle is exclusive on the right and bottom edges.
pub fn alpha_bbox(rgba: &[u8], width: u32, threshold: u8) -> Option<Rect> {
    let width = width as usize;
    if width == 0 {
        return None;
    }
    let mut bounds: Option<(usize, usize, usize, usize)> = None;
    for (i, px) in rgba.chunks_exact(4).enumerate() {
        if px[3] <= threshold {
            continue;
        }
        let (x, y) = (i % width, i / width);
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    let (x0, y0, x1, y1) = bounds?;
    Some(Rect::new(
        x0 as f64,
        y0 as f64,
        (x1 + 1) as f64,
        (y1 + 1) as f64,
    ))
}
