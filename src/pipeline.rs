//! Single-sheet extraction: parse, resolve bboxes, cluster, filter, export.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use rayon::prelude::*;

use crate::bbox::{BBoxResolver, RasterResolver, create_resolver};
use crate::cluster::cluster;
use crate::config::{ExtractOpts, build_thread_pool};
use crate::export::{PoseDocument, assemble_poses, filter_and_sort, write_poses};
use crate::foundation::core::{CanvasSize, Rect};
use crate::foundation::error::{PoseError, PoseResult};
use crate::sheet::document::{SpriteSheet, TopGroup, parse_document};

/// Summary of one sheet's extraction.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct PoseReport {
    pub sheet: PathBuf,
    pub canvas: CanvasSize,
    /// Resolver that produced the bboxes (`raster` or `analytic`).
    pub strategy: &'static str,
    pub groups_total: usize,
    pub groups_drawable: usize,
    pub components: usize,
    /// Written SVG files in pose order; empty for a dry run.
    pub written: Vec<PathBuf>,
}

/// Pose documents assembled in memory, before anything touches the output directory.
#[derive(Clone, Debug)]
pub struct PosePlan {
    pub report: PoseReport,
    pub documents: Vec<PoseDocument>,
}

/// Turn a path naming a sheet, or a directory of sheets, into the sheet to process.
///
/// For a directory, the first `*.svg` by file name is chosen.
pub fn resolve_input(input: &Path) -> PoseResult<PathBuf> {
    if !input.exists() {
        return Err(PoseError::input_not_found(input));
    }
    if !input.is_dir() {
        return Ok(input.to_path_buf());
    }
    let first = list_svgs(input)?.into_iter().next();
    match first {
        Some(path) => {
            tracing::info!(dir = %input.display(), sheet = %path.display(), "input is a directory, using first svg");
            Ok(path)
        }
        None => Err(PoseError::input_not_found(input)),
    }
}

/// `*.svg` files directly inside `dir`, sorted by file name.
pub fn list_svgs(dir: &Path) -> PoseResult<Vec<PathBuf>> {
    let rd = std::fs::read_dir(dir).with_context(|| format!("read dir '{}'", dir.display()))?;
    let mut out = Vec::new();
    for entry in rd {
        let path = entry
            .with_context(|| format!("read dir entry in '{}'", dir.display()))?
            .path();
        let is_svg = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
        if is_svg && path.is_file() {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

/// Extract poses from one sheet (or the first sheet in a directory) into `out_dir`.
#[tracing::instrument(skip(opts))]
pub fn extract_poses(input: &Path, out_dir: &Path, opts: &ExtractOpts) -> PoseResult<PoseReport> {
    let sheet_path = resolve_input(input)?;
    let text = std::fs::read_to_string(&sheet_path)
        .with_context(|| format!("read sheet '{}'", sheet_path.display()))?;
    extract_poses_from_str(&text, &sheet_path, out_dir, opts)
}

/// Extract poses from sheet text. `source` names the sheet in errors and reports.
pub fn extract_poses_from_str(
    text: &str,
    source: &Path,
    out_dir: &Path,
    opts: &ExtractOpts,
) -> PoseResult<PoseReport> {
    let PosePlan {
        mut report,
        documents,
    } = plan_poses(text, source, opts)?;

    let preview = opts
        .preview_png
        .then(|| RasterResolver::new(1.0, opts.alpha_threshold));
    report.written = write_poses(out_dir, &documents, preview.as_ref())?;
    tracing::info!(
        sheet = %source.display(),
        poses = report.written.len(),
        "extracted poses"
    );
    Ok(report)
}

/// Run everything up to, but excluding, writing files.
pub fn plan_poses(text: &str, source: &Path, opts: &ExtractOpts) -> PoseResult<PosePlan> {
    opts.validate()?;
    let doc = parse_document(text).map_err(|e| name_source(e, source))?;
    let sheet = SpriteSheet::new(&doc)?;
    let resolver = create_resolver(opts.strategy, &sheet, opts.raster_scale, opts.alpha_threshold);

    let resolved =
        resolve_all(resolver.as_ref(), &sheet, opts).map_err(|e| name_source(e, source))?;
    let mut groups: Vec<TopGroup<'_, '_>> = Vec::with_capacity(resolved.len());
    let mut bboxes: Vec<Rect> = Vec::with_capacity(resolved.len());
    for (group, bbox) in sheet.groups().iter().zip(resolved) {
        match bbox {
            Some(bb) => {
                tracing::debug!(index = group.index, ?bb, "group bbox");
                groups.push(*group);
                bboxes.push(bb);
            }
            None => tracing::debug!(index = group.index, "group has no visible geometry"),
        }
    }
    if groups.is_empty() {
        return Err(PoseError::NoDrawableContent {
            path: source.to_path_buf(),
        });
    }

    let components = cluster(&bboxes, &opts.predicate);
    let component_count = components.len();
    let candidates = filter_and_sort(components, &bboxes, &opts.filter());
    if candidates.is_empty() {
        return Err(PoseError::NoValidPoses {
            path: source.to_path_buf(),
            components: component_count,
        });
    }

    let documents = assemble_poses(&sheet, &groups, &candidates, opts.export_margin, &opts.prefix);
    Ok(PosePlan {
        report: PoseReport {
            sheet: source.to_path_buf(),
            canvas: sheet.canvas(),
            strategy: resolver.name(),
            groups_total: sheet.groups().len(),
            groups_drawable: groups.len(),
            components: component_count,
            written: Vec::new(),
        },
        documents,
    })
}

/// Prefix parse and raster messages with the sheet they came from.
fn name_source(err: PoseError, source: &Path) -> PoseError {
    match err {
        PoseError::Parse(msg) => PoseError::parse(format!("'{}': {msg}", source.display())),
        PoseError::Raster(msg) => PoseError::raster(format!("'{}': {msg}", source.display())),
        other => other,
    }
}

/// Resolve every top-level group, in document order regardless of scheduling.
fn resolve_all(
    resolver: &dyn BBoxResolver,
    sheet: &SpriteSheet<'_, '_>,
    opts: &ExtractOpts,
) -> PoseResult<Vec<Option<Rect>>> {
    let groups = sheet.groups();
    if !opts.parallel {
        return groups.iter().map(|g| resolver.resolve(sheet, g)).collect();
    }
    let pool = build_thread_pool(opts.threads)?;
    pool.install(|| {
        groups
            .par_iter()
            .map(|g| resolver.resolve(sheet, g))
            .collect::<Vec<_>>()
    })
    .into_iter()
    .collect()
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
