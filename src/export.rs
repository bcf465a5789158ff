//! Pose filtering, reading-order numbering and standalone SVG export.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::bbox::RasterResolver;
use crate::cluster::union_bbox;
use crate::foundation::core::{CanvasSize, Rect};
use crate::foundation::error::{PoseError, PoseResult};
use crate::sheet::document::{SpriteSheet, TopGroup};
use crate::sheet::writer::{DocumentFrame, Namespaces, write_document};

/// Rules deciding which components are poses and how they are ordered.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoseFilter {
    pub min_groups: usize,
    pub min_width: f64,
    pub min_height: f64,
    pub row_band: f64,
}

impl Default for PoseFilter {
    fn default() -> Self {
        Self {
            min_groups: 4,
            min_width: 20.0,
            min_height: 20.0,
            row_band: 100.0,
        }
    }
}

impl PoseFilter {
    pub fn accepts(&self, members: usize, bbox: Rect) -> bool {
        members >= self.min_groups
            && bbox.width() >= self.min_width
            && bbox.height() >= self.min_height
    }
}

/// A component that survived filtering, with its union bbox.
#[derive(Clone, Debug, PartialEq)]
pub struct PoseCandidate {
    /// Indices into the bbox list the components were built from, ascending.
    pub members: Vec<usize>,
    pub bbox: Rect,
}

/// Reading-order key: the band of the top edge, then the left edge.
pub fn row_major_key(bbox: Rect, row_band: f64) -> (i64, f64) {
    ((bbox.y0 / row_band).floor() as i64, bbox.x0)
}

fn cmp_row_major(a: Rect, b: Rect, row_band: f64) -> Ordering {
    let (ba, xa) = row_major_key(a, row_band);
    let (bb, xb) = row_major_key(b, row_band);
    ba.cmp(&bb).then(xa.total_cmp(&xb))
}

/// Drop components that are too sparse or too small, then sort the rest in reading order.
pub fn filter_and_sort(
    components: Vec<Vec<usize>>,
    bboxes: &[Rect],
    filter: &PoseFilter,
) -> Vec<PoseCandidate> {
    let mut out: Vec<PoseCandidate> = components
        .into_iter()
        .filter_map(|members| {
            let bbox = union_bbox(bboxes, &members)?;
            if filter.accepts(members.len(), bbox) {
                Some(PoseCandidate { members, bbox })
            } else {
                tracing::debug!(
                    groups = members.len(),
                    width = bbox.width(),
                    height = bbox.height(),
                    "dropping component"
                );
                None
            }
        })
        .collect();
    out.sort_by(|a, b| cmp_row_major(a.bbox, b.bbox, filter.row_band));
    out
}

/// Grow `bbox` by `margin`, clamp it to the canvas, and keep at least one unit per side.
pub fn crop_rect(bbox: Rect, margin: f64, canvas: CanvasSize) -> Rect {
    let bounds = canvas.to_rect();
    let x0 = (bbox.x0 - margin).max(bounds.x0);
    let y0 = (bbox.y0 - margin).max(bounds.y0);
    let x1 = (bbox.x1 + margin).min(bounds.x1);
    let y1 = (bbox.y1 + margin).min(bounds.y1);
    Rect::new(x0, y0, x0 + (x1 - x0).max(1.0), y0 + (y1 - y0).max(1.0))
}

/// `{prefix}_{NN}` with a 1-based, two-digit, zero-padded sequence number.
pub fn pose_stem(prefix: &str, number: usize) -> String {
    format!("{prefix}_{number:02}")
}

/// One assembled pose, ready to be written.
#[derive(Clone, Debug)]
pub struct PoseDocument {
    pub file_name: String,
    pub crop: Rect,
    /// Original document indices of the groups it contains, ascending.
    pub group_indices: Vec<usize>,
    pub svg: String,
}

/// Build a standalone document holding `groups` (already in document order) cropped to `crop`.
pub fn build_pose_svg(
    sheet: &SpriteSheet<'_, '_>,
    groups: &[TopGroup<'_, '_>],
    crop: Rect,
) -> String {
    let mut ns = Namespaces::from_root(sheet.root());
    for g in groups {
        ns.absorb(g.node);
    }
    write_document(
        DocumentFrame {
            view_box: crop,
            width: crop.width(),
            height: crop.height(),
            wrap_group: true,
        },
        &ns,
        sheet.shared(),
        groups.iter().map(|g| g.node),
    )
}

/// Assemble every pose document for a sheet.
///
/// `groups[i]` is the top-level group behind `bboxes[i]`; candidates index into both.
pub fn assemble_poses(
    sheet: &SpriteSheet<'_, '_>,
    groups: &[TopGroup<'_, '_>],
    candidates: &[PoseCandidate],
    margin: f64,
    prefix: &str,
) -> Vec<PoseDocument> {
    candidates
        .iter()
        .enumerate()
        .map(|(k, cand)| {
            let crop = crop_rect(cand.bbox, margin, sheet.canvas());
            let mut members: Vec<TopGroup<'_, '_>> =
                cand.members.iter().map(|&i| groups[i]).collect();
            members.sort_by_key(|g| g.index);
            PoseDocument {
                file_name: format!("{}.svg", pose_stem(prefix, k + 1)),
                crop,
                group_indices: members.iter().map(|g| g.index).collect(),
                svg: build_pose_svg(sheet, &members, crop),
            }
        })
        .collect()
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Write `bytes` to `path` through a sibling temp file, so readers never see a partial file.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> PoseResult<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| PoseError::validation(format!("bad output path '{}'", path.display())))?;
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));
    let mut guard = TempFileGuard(Some(tmp.clone()));

    std::fs::write(&tmp, bytes).with_context(|| format!("write '{}'", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("rename '{}' to '{}'", tmp.display(), path.display()))?;
    guard.0 = None;
    Ok(())
}

/// Write assembled documents into `out_dir`, creating it (and its parents) when absent.
pub fn write_poses(
    out_dir: &Path,
    docs: &[PoseDocument],
    preview: Option<&RasterResolver>,
) -> PoseResult<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("create output dir '{}'", out_dir.display()))?;

    let mut written = Vec::with_capacity(docs.len());
    for doc in docs {
        let path = out_dir.join(&doc.file_name);
        write_atomic(&path, doc.svg.as_bytes())?;
        tracing::info!(path = %path.display(), groups = doc.group_indices.len(), "wrote pose");
        if let Some(renderer) = preview {
            write_preview(renderer, doc, &path.with_extension("png"))?;
        }
        written.push(path);
    }
    Ok(written)
}

fn write_preview(renderer: &RasterResolver, doc: &PoseDocument, path: &Path) -> PoseResult<()> {
    let width = (doc.crop.width().ceil() as u32).max(1);
    let height = (doc.crop.height().ceil() as u32).max(1);
    let mut rgba = renderer.render_premul(&doc.svg, width, height)?;
    unpremultiply_rgba8_in_place(&mut rgba);

    let tmp = path.with_extension("png.tmp");
    let mut guard = TempFileGuard(Some(tmp.clone()));
    image::save_buffer_with_format(
        &tmp,
        &rgba,
        width,
        height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("rename '{}' to '{}'", tmp.display(), path.display()))?;
    guard.0 = None;
    Ok(())
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/export.rs"]
mod tests;
