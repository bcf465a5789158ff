//! Directory-level driver: every sheet in a folder, one output subdirectory per sheet.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::config::{ExtractOpts, build_thread_pool};
use crate::foundation::error::{PoseError, PoseResult};
use crate::pipeline::{PoseReport, extract_poses, list_svgs};

/// Result of one sheet inside a batch.
#[derive(Clone, Debug, serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    Extracted(PoseReport),
    Failed { sheet: PathBuf, error: String },
}

impl BatchOutcome {
    pub fn sheet(&self) -> &Path {
        match self {
            Self::Extracted(report) => &report.sheet,
            Self::Failed { sheet, .. } => sheet,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Extracted(_))
    }
}

/// Per-sheet outcomes, ordered by sheet file name.
#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<BatchOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn poses_written(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o {
                BatchOutcome::Extracted(r) => r.written.len(),
                BatchOutcome::Failed { .. } => 0,
            })
            .sum()
    }
}

/// Output folder for one sheet: `<output_dir>/<stem>`.
fn sheet_out_dir(output_dir: &Path, sheet: &Path) -> PathBuf {
    let stem = sheet
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sheet".to_string());
    output_dir.join(stem)
}

fn run_one(sheet: &Path, output_dir: &Path, opts: &ExtractOpts) -> BatchOutcome {
    match extract_poses(sheet, &sheet_out_dir(output_dir, sheet), opts) {
        Ok(report) => BatchOutcome::Extracted(report),
        Err(err) => {
            tracing::warn!(sheet = %sheet.display(), error = %err, "sheet failed, continuing");
            BatchOutcome::Failed {
                sheet: sheet.to_path_buf(),
                error: err.to_string(),
            }
        }
    }
}

/// Extract every `*.svg` directly inside `input_dir`.
///
/// A failing sheet is recorded and the rest still run. With `opts.parallel`, sheets are spread
/// over the pool and each sheet resolves its groups sequentially.
#[tracing::instrument(skip(opts))]
pub fn extract_all(input_dir: &Path, output_dir: &Path, opts: &ExtractOpts) -> PoseResult<BatchReport> {
    if !input_dir.is_dir() {
        return Err(PoseError::input_not_found(input_dir));
    }
    opts.validate()?;
    let sheets = list_svgs(input_dir)?;
    if sheets.is_empty() {
        tracing::warn!(dir = %input_dir.display(), "no svg sheets found");
    }

    let outcomes = if opts.parallel {
        let per_sheet = ExtractOpts {
            parallel: false,
            ..opts.clone()
        };
        let pool = build_thread_pool(opts.threads)?;
        pool.install(|| {
            sheets
                .par_iter()
                .map(|s| run_one(s, output_dir, &per_sheet))
                .collect()
        })
    } else {
        sheets.iter().map(|s| run_one(s, output_dir, opts)).collect()
    };

    let report = BatchReport { outcomes };
    tracing::info!(
        sheets = report.outcomes.len(),
        failed = report.failed(),
        poses = report.poses_written(),
        "batch finished"
    );
    Ok(report)
}

#[cfg(test)]
#[path = "../tests/unit/batch.rs"]
mod tests;
