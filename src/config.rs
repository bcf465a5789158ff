//! Tunables for one extraction run.

use std::{fs::File, io::BufReader, path::Path};

use crate::bbox::BBoxStrategy;
use crate::cluster::OverlapPredicate;
use crate::export::PoseFilter;
use crate::foundation::error::{PoseError, PoseResult};

/// Options shared by single-sheet and batch extraction.
///
/// Every field has a default, so a JSON config only needs the values it changes.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractOpts {
    pub strategy: BBoxStrategy,
    /// Pixels per canvas unit when rasterizing groups.
    pub raster_scale: f64,
    /// Pixels with alpha strictly above this value count as visible.
    pub alpha_threshold: u8,
    pub predicate: OverlapPredicate,
    pub min_groups: usize,
    pub min_pose_width: f64,
    pub min_pose_height: f64,
    /// Height of the reading-order bands used to number poses.
    pub row_band: f64,
    /// Padding added around each pose's crop, clamped to the canvas.
    pub export_margin: f64,
    pub prefix: String,
    /// Resolve group bboxes (and batch sheets) on a rayon pool.
    pub parallel: bool,
    /// Worker count for the pool; rayon's default when unset.
    pub threads: Option<usize>,
    /// Also write a PNG render next to every exported SVG.
    pub preview_png: bool,
}

impl Default for ExtractOpts {
    fn default() -> Self {
        Self {
            strategy: BBoxStrategy::Raster,
            raster_scale: 1.0,
            alpha_threshold: 1,
            predicate: OverlapPredicate::padded(),
            min_groups: 4,
            min_pose_width: 20.0,
            min_pose_height: 20.0,
            row_band: 100.0,
            export_margin: 8.0,
            prefix: "pose".to_string(),
            parallel: false,
            threads: None,
            preview_png: false,
        }
    }
}

impl ExtractOpts {
    /// Load options from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> PoseResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            PoseError::validation(format!("open config '{}': {e}", path.display()))
        })?;
        let opts: Self = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            PoseError::validation(format!("parse config '{}': {e}", path.display()))
        })?;
        opts.validate()?;
        Ok(opts)
    }

    pub fn validate(&self) -> PoseResult<()> {
        fn finite_non_negative(name: &str, v: f64) -> PoseResult<()> {
            if !v.is_finite() || v < 0.0 {
                return Err(PoseError::validation(format!(
                    "'{name}' must be a finite value >= 0, got {v}"
                )));
            }
            Ok(())
        }

        if !self.raster_scale.is_finite() || self.raster_scale <= 0.0 {
            return Err(PoseError::validation("'raster_scale' must be > 0"));
        }
        if !self.row_band.is_finite() || self.row_band <= 0.0 {
            return Err(PoseError::validation("'row_band' must be > 0"));
        }
        finite_non_negative("export_margin", self.export_margin)?;
        finite_non_negative("min_pose_width", self.min_pose_width)?;
        finite_non_negative("min_pose_height", self.min_pose_height)?;
        match self.predicate {
            OverlapPredicate::Padded { pad } => finite_non_negative("pad", pad)?,
            OverlapPredicate::AreaShare {
                min_area,
                min_share,
            } => {
                finite_non_negative("min_area", min_area)?;
                if !(0.0..=1.0).contains(&min_share) {
                    return Err(PoseError::validation("'min_share' must be within [0, 1]"));
                }
            }
        }
        if self.prefix.is_empty() || self.prefix.contains(['/', '\\']) {
            return Err(PoseError::validation(
                "'prefix' must be non-empty and contain no path separators",
            ));
        }
        if let Some(n) = self.threads
            && n == 0
        {
            return Err(PoseError::validation("'threads' must be >= 1 when set"));
        }
        Ok(())
    }

    pub fn filter(&self) -> PoseFilter {
        PoseFilter {
            min_groups: self.min_groups,
            min_width: self.min_pose_width,
            min_height: self.min_pose_height,
            row_band: self.row_band,
        }
    }
}

pub(crate) fn build_thread_pool(threads: Option<usize>) -> PoseResult<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| PoseError::validation(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
