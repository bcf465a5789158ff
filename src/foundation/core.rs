pub use kurbo::{Affine, Point, Rect, Vec2};

/// Canvas extent used when a sheet declares neither `viewBox` nor `width`/`height`.
pub const DEFAULT_CANVAS_EXTENT: f64 = 1000.0;

/// A sheet's drawing canvas in canvas units: the `viewBox` origin and extent.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CanvasSize {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_EXTENT, DEFAULT_CANVAS_EXTENT)
    }
}

impl CanvasSize {
    /// A canvas anchored at the origin.
    pub fn new(width: f64, height: f64) -> Self {
        Self::from_view_box(0.0, 0.0, width, height)
    }

    pub fn from_view_box(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn origin(self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn to_rect(self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

/// Union of two possibly absent boxes. Absent is the neutral element.
pub fn union_opt(a: Option<Rect>, b: Option<Rect>) -> Option<Rect> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.union(b)),
        (Some(r), None) | (None, Some(r)) => Some(r),
        (None, None) => None,
    }
}

/// Intersection of two boxes, or `None` when they do not overlap with positive area.
pub fn intersection(a: Rect, b: Rect) -> Option<Rect> {
    let x0 = a.x0.max(b.x0);
    let y0 = a.y0.max(b.y0);
    let x1 = a.x1.min(b.x1);
    let y1 = a.y1.min(b.y1);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(Rect::new(x0, y0, x1, y1))
}

/// Axis-aligned bounds of a point set, `None` for an empty set.
pub fn bounds_of_points(points: impl IntoIterator<Item = Point>) -> Option<Rect> {
    let mut it = points.into_iter();
    let first = it.next()?;
    let mut r = Rect::from_points(first, first);
    for p in it {
        r = r.union_pt(p);
    }
    Some(r)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
