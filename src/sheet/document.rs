use std::collections::{HashMap, HashSet};

use crate::foundation::core::{CanvasSize, DEFAULT_CANVAS_EXTENT};
use crate::foundation::error::{PoseError, PoseResult};
use crate::transform::affine;

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Drawable elements the analytic walk has no geometry for.
const UNMEASURED_SHAPES: &[&str] = &[
    "rect",
    "circle",
    "ellipse",
    "line",
    "polyline",
    "polygon",
    "image",
    "text",
    "foreignObject",
];

/// Kind of a drawing element, as far as bounding-box resolution cares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    /// `<g>`, and `<symbol>` when reached through a `<use>`.
    Group,
    Path,
    Use,
    Other,
}

impl ElementKind {
    pub fn of(node: roxmltree::Node<'_, '_>) -> Self {
        if !node.is_element() {
            return Self::Other;
        }
        match node.tag_name().name() {
            "g" | "symbol" => Self::Group,
            "path" => Self::Path,
            "use" => Self::Use,
            _ => Self::Other,
        }
    }
}

/// A direct `<g>` child of the document root.
#[derive(Clone, Copy, Debug)]
pub struct TopGroup<'a, 'input> {
    /// Position among the root's element children; restores z-order on export.
    pub index: usize,
    pub node: roxmltree::Node<'a, 'input>,
}

/// A transform entry the analytic strategy cannot model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsupportedTransform {
    pub kind: String,
    pub element: String,
    pub id: Option<String>,
}

/// Parse sheet text into an XML tree. DTDs are allowed since vector editors emit them.
pub fn parse_document(text: &str) -> PoseResult<roxmltree::Document<'_>> {
    let opts = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    roxmltree::Document::parse_with_options(text, opts)
        .map_err(|e| PoseError::parse(format!("malformed svg: {e}")))
}

/// Borrowed view over one parsed sprite sheet.
#[derive(Debug)]
pub struct SpriteSheet<'a, 'input> {
    root: roxmltree::Node<'a, 'input>,
    canvas: CanvasSize,
    groups: Vec<TopGroup<'a, 'input>>,
    shared: Vec<roxmltree::Node<'a, 'input>>,
    ids: HashMap<&'a str, roxmltree::Node<'a, 'input>>,
}

impl<'a, 'input> SpriteSheet<'a, 'input> {
    pub fn new(doc: &'a roxmltree::Document<'input>) -> PoseResult<Self> {
        let root = doc.root_element();
        if root.tag_name().name() != "svg" {
            return Err(PoseError::parse(format!(
                "root element is <{}>, expected <svg>",
                root.tag_name().name()
            )));
        }

        let groups = root
            .children()
            .filter(|n| n.is_element())
            .enumerate()
            .filter(|(_, n)| n.tag_name().name() == "g")
            .map(|(index, node)| TopGroup { index, node })
            .collect();

        Ok(Self {
            root,
            canvas: canvas_size(root),
            groups,
            shared: shared_resources(root),
            ids: build_id_index(root),
        })
    }

    pub fn root(&self) -> roxmltree::Node<'a, 'input> {
        self.root
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    /// Top-level groups in document order.
    pub fn groups(&self) -> &[TopGroup<'a, 'input>] {
        &self.groups
    }

    /// Root-level `<defs>` and `<style>` elements, copied into every derived document.
    pub fn shared(&self) -> &[roxmltree::Node<'a, 'input>] {
        &self.shared
    }

    /// Look up an element defined under `<defs>` by its `id`.
    pub fn lookup(&self, id: &str) -> Option<roxmltree::Node<'a, 'input>> {
        self.ids.get(id).copied()
    }

    /// Every `rotate`/`scale`/`skewX`/`skewY` entry in the document.
    pub fn unsupported_transforms(&self) -> Vec<UnsupportedTransform> {
        let mut out = Vec::new();
        for node in self.root.descendants().filter(|n| n.is_element()) {
            let Some(attr) = node.attribute("transform") else {
                continue;
            };
            for kind in affine::unsupported_kinds(attr) {
                out.push(UnsupportedTransform {
                    kind,
                    element: node.tag_name().name().to_string(),
                    id: node.attribute("id").map(str::to_string),
                });
            }
        }
        out
    }

    /// Drawable non-path elements inside top-level groups, including `<use>` targets.
    ///
    /// Each entry is `(group index, element name)`, grouped by top-level group.
    pub fn unmeasured_shapes(&self) -> Vec<(usize, String)> {
        let mut out = Vec::new();
        for group in &self.groups {
            let mut visited = HashSet::new();
            let mut stack = vec![group.node];
            while let Some(node) = stack.pop() {
                for n in node.descendants().filter(|n| n.is_element()) {
                    let name = n.tag_name().name();
                    if UNMEASURED_SHAPES.contains(&name) {
                        out.push((group.index, name.to_string()));
                    } else if ElementKind::of(n) == ElementKind::Use
                        && let Some(target) = href_id(n).and_then(|id| self.lookup(id))
                        && visited.insert(target.id())
                    {
                        stack.push(target);
                    }
                }
            }
        }
        out
    }
}

/// Canvas extent from `viewBox`, else `width`/`height`, else 1000 x 1000.
pub fn canvas_size(root: roxmltree::Node<'_, '_>) -> CanvasSize {
    if let Some(vb) = root.attribute("viewBox") {
        match parse_view_box(vb) {
            Some((x, y, w, h)) => return CanvasSize::from_view_box(x, y, w, h),
            None => tracing::warn!(view_box = vb, "ignoring malformed viewBox"),
        }
    }
    CanvasSize::new(
        parse_length(root.attribute("width")),
        parse_length(root.attribute("height")),
    )
}

fn parse_view_box(vb: &str) -> Option<(f64, f64, f64, f64)> {
    let nums = vb
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().ok())
        .collect::<Option<Vec<_>>>()?;
    match nums.as_slice() {
        [x, y, w, h] if *w > 0.0 && *h > 0.0 => Some((*x, *y, *w, *h)),
        _ => None,
    }
}

fn parse_length(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return DEFAULT_CANVAS_EXTENT;
    };
    let trimmed = raw.trim();
    let number = trimmed.strip_suffix("px").unwrap_or(trimmed).trim();
    match number.parse::<f64>() {
        Ok(v) if v > 0.0 => v,
        _ => {
            tracing::warn!(length = raw, "unsupported canvas length, using default extent");
            DEFAULT_CANVAS_EXTENT
        }
    }
}

fn shared_resources<'a, 'input>(
    root: roxmltree::Node<'a, 'input>,
) -> Vec<roxmltree::Node<'a, 'input>> {
    let mut out: Vec<_> = root
        .children()
        .filter(|n| matches!(n.tag_name().name(), "defs" | "style") && n.is_element())
        .collect();
    if !out.iter().any(|n| n.tag_name().name() == "defs")
        && let Some(nested) = root
            .descendants()
            .find(|n| n.is_element() && n.tag_name().name() == "defs")
    {
        out.insert(0, nested);
    }
    out
}

fn build_id_index<'a, 'input>(
    root: roxmltree::Node<'a, 'input>,
) -> HashMap<&'a str, roxmltree::Node<'a, 'input>> {
    let mut out = HashMap::new();
    let defs = root
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "defs");
    for d in defs {
        for node in d.descendants().filter(|n| n.is_element()) {
            if let Some(id) = node.attribute("id") {
                // First wins.
                out.entry(id).or_insert(node);
            }
        }
    }
    out
}

/// Target id of a `<use>` element's `href`/`xlink:href`, without the leading `#`.
pub fn href_id<'a>(node: roxmltree::Node<'a, '_>) -> Option<&'a str> {
    let raw = node
        .attribute((XLINK_NS, "href"))
        .or_else(|| node.attribute("href"))?;
    let id = raw.trim().strip_prefix('#')?;
    if id.is_empty() { None } else { Some(id) }
}

#[cfg(test)]
#[path = "../../tests/unit/sheet/document.rs"]
mod tests;
