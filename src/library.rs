//! Lookup of exported poses by sprite name and pose number.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{PoseError, PoseResult};

const VECTOR_SUFFIX: &str = "_vector";

/// A folder of `{prefix}_NN.svg` files for one sprite.
#[derive(Clone, Debug)]
pub struct PoseLibrary {
    dir: PathBuf,
    prefix: String,
}

impl PoseLibrary {
    /// Open `poses_root/<sprite>`, falling back to `poses_root/<sprite>_vector`.
    ///
    /// The sprite name is matched lowercase, the way batch output folders are usually named.
    pub fn open(poses_root: &Path, sprite_name: &str) -> PoseResult<Self> {
        Self::open_with_prefix(poses_root, sprite_name, "pose")
    }

    pub fn open_with_prefix(poses_root: &Path, sprite_name: &str, prefix: &str) -> PoseResult<Self> {
        let name = sprite_name.to_lowercase();
        let primary = poses_root.join(&name);
        let dir = if primary.is_dir() {
            primary
        } else {
            let fallback = poses_root.join(format!("{name}{VECTOR_SUFFIX}"));
            if !fallback.is_dir() {
                return Err(PoseError::input_not_found(primary));
            }
            tracing::debug!(dir = %fallback.display(), "using vector fallback folder");
            fallback
        };
        Ok(Self {
            dir,
            prefix: prefix.to_string(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of pose `number` (e.g. `"08"`), which must exist.
    pub fn pose_path(&self, number: &str) -> PoseResult<PathBuf> {
        let path = self.dir.join(format!("{}_{number}.svg", self.prefix));
        if !path.is_file() {
            return Err(PoseError::input_not_found(path));
        }
        Ok(path)
    }

    /// Available pose numbers, sorted numerically.
    pub fn poses(&self) -> PoseResult<Vec<String>> {
        let head = format!("{}_", self.prefix);
        let rd = std::fs::read_dir(&self.dir)
            .with_context(|| format!("read dir '{}'", self.dir.display()))?;
        let mut out = Vec::new();
        for entry in rd {
            let entry = entry.with_context(|| format!("read dir entry in '{}'", self.dir.display()))?;
            let file_name = entry.file_name();
            let Some(number) = file_name
                .to_str()
                .and_then(|n| n.strip_prefix(&head))
                .and_then(|n| n.strip_suffix(".svg"))
            else {
                continue;
            };
            if !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit()) {
                out.push(number.to_string());
            }
        }
        out.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../tests/unit/library.rs"]
mod tests;
