use std::path::PathBuf;

/// Convenience result type used across posecut.
pub type PoseResult<T> = Result<T, PoseError>;

/// Top-level error taxonomy used by the extraction APIs.
#[derive(thiserror::Error, Debug)]
pub enum PoseError {
    /// The input file or directory does not exist, or a directory holds no SVG.
    #[error("input not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    /// Every top-level group resolved to an absent bounding box.
    #[error("no drawable top-level <g> elements detected in '{}'", path.display())]
    NoDrawableContent { path: PathBuf },

    /// Clustering produced components but all of them were filtered out.
    #[error(
        "no valid poses detected after clustering '{}' ({components} component(s) rejected)",
        path.display()
    )]
    NoValidPoses { path: PathBuf, components: usize },

    /// The sheet is not a well-formed SVG document.
    #[error("parse error: {0}")]
    Parse(String),

    /// Rasterizing a group for alpha scanning failed.
    #[error("raster error: {0}")]
    Raster(String),

    /// Invalid user-provided options.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PoseError {
    /// Build a [`PoseError::InputNotFound`] value.
    pub fn input_not_found(path: impl Into<PathBuf>) -> Self {
        Self::InputNotFound { path: path.into() }
    }

    /// Build a [`PoseError::Parse`] value.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Build a [`PoseError::Raster`] value.
    pub fn raster(msg: impl Into<String>) -> Self {
        Self::Raster(msg.into())
    }

    /// Build a [`PoseError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
