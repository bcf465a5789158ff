//! Overlap graph construction and connected-component extraction.

use crate::foundation::core::{Rect, intersection};

/// Decides whether two group bounding boxes belong to the same pose.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum OverlapPredicate {
    /// Boxes touch when they intersect or their gap is at most `pad` on both axes.
    Padded { pad: f64 },
    /// Boxes touch when their true intersection covers at least `min_area` square units and
    /// at least `min_share` of the smaller box's area.
    AreaShare { min_area: f64, min_share: f64 },
}

impl Default for OverlapPredicate {
    fn default() -> Self {
        Self::padded()
    }
}

impl OverlapPredicate {
    pub const DEFAULT_PAD: f64 = 1.0;
    pub const DEFAULT_MIN_AREA: f64 = 100.0;
    pub const DEFAULT_MIN_SHARE: f64 = 0.10;

    pub fn padded() -> Self {
        Self::Padded {
            pad: Self::DEFAULT_PAD,
        }
    }

    pub fn area_share() -> Self {
        Self::AreaShare {
            min_area: Self::DEFAULT_MIN_AREA,
            min_share: Self::DEFAULT_MIN_SHARE,
        }
    }

    pub fn overlaps(&self, a: Rect, b: Rect) -> bool {
        match *self {
            Self::Padded { pad } => {
                !(a.x1 < b.x0 - pad || b.x1 < a.x0 - pad || a.y1 < b.y0 - pad || b.y1 < a.y0 - pad)
            }
            Self::AreaShare {
                min_area,
                min_share,
            } => {
                let Some(shared) = intersection(a, b) else {
                    return false;
                };
                let area = shared.area();
                let smaller = a.area().min(b.area());
                area >= min_area && area >= min_share * smaller
            }
        }
    }
}

/// Group boxes into connected components of the overlap graph.
///
/// Node `i` is `bboxes[i]`. Components are listed in order of their smallest member and each
/// component's members are ascending, so the result is stable for a given input.
pub fn cluster(bboxes: &[Rect], predicate: &OverlapPredicate) -> Vec<Vec<usize>> {
    let n = bboxes.len();
    let mut adj = vec![Vec::new(); n];
    for i in 0..n {
        for j in (i + 1)..n {
            if predicate.overlaps(bboxes[i], bboxes[j]) {
                adj[i].push(j);
                adj[j].push(i);
            }
        }
    }

    let mut seen = vec![false; n];
    let mut components = Vec::new();
    for start in 0..n {
        if seen[start] {
            continue;
        }
        seen[start] = true;
        let mut stack = vec![start];
        let mut comp = Vec::new();
        while let Some(u) = stack.pop() {
            comp.push(u);
            for &v in &adj[u] {
                if !seen[v] {
                    seen[v] = true;
                    stack.push(v);
                }
            }
        }
        comp.sort_unstable();
        components.push(comp);
    }
    components
}

/// Smallest box containing every indexed box, `None` for an empty selection.
pub fn union_bbox(bboxes: &[Rect], members: &[usize]) -> Option<Rect> {
    members
        .iter()
        .map(|&i| bboxes[i])
        .reduce(|acc, r| acc.union(r))
}

#[cfg(test)]
#[path = "../tests/unit/cluster.rs"]
mod tests;
