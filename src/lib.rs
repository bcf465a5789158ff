//! posecut splits vector sprite sheets into standalone, tightly cropped pose SVGs.
//!
//! A sheet is one SVG canvas whose top-level `<g>` elements are the drawing groups of many
//! character poses. Extraction runs in four steps:
//!
//! 1. **Resolve**: every top-level group gets a bounding box, either by rendering it alone and
//!    scanning alpha ([`BBoxStrategy::Raster`]) or by walking transforms and path data
//!    ([`BBoxStrategy::Analytic`]).
//! 2. **Cluster**: groups whose boxes overlap (see [`OverlapPredicate`]) are joined into
//!    connected components.
//! 3. **Filter**: components with too few groups or too small an extent are dropped and the rest
//!    are numbered in reading order.
//! 4. **Export**: each pose is written as `pose_NN.svg`, carrying the sheet's shared `<defs>`
//!    and `<style>` and a viewBox cropped to the pose plus a margin.
//!
//! [`extract_poses`] handles one sheet, [`extract_all`] a folder of sheets, and
//! [`PoseLibrary`] looks exported poses up again by sprite name and number.
#![forbid(unsafe_code)]

mod foundation;

pub mod batch;
pub mod bbox;
pub mod cluster;
pub mod config;
pub mod export;
pub mod geometry;
pub mod library;
pub mod pipeline;
pub mod sheet;
/// SVG `transform` attribute parsing and affine helpers.
pub mod transform;

pub use batch::{BatchOutcome, BatchReport, extract_all};
pub use bbox::{BBoxResolver, BBoxStrategy, create_resolver};
pub use cluster::{OverlapPredicate, cluster};
pub use config::ExtractOpts;
pub use export::{PoseDocument, PoseFilter};
pub use foundation::core::{
    Affine, CanvasSize, Point, Rect, Vec2, bounds_of_points, intersection, union_opt,
};
pub use foundation::error::{PoseError, PoseResult};
pub use library::PoseLibrary;
pub use pipeline::{
    PosePlan, PoseReport, extract_poses, extract_poses_from_str, list_svgs, plan_poses,
    resolve_input,
};
pub use sheet::document::{SpriteSheet, TopGroup, parse_document};
