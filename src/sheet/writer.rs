//! Re-serialization of parsed SVG subtrees into standalone documents.
//!
//! Nodes are written from the parsed tree rather than sliced from the source text, so entity
//! references are expanded and namespace prefixes are normalized against the declarations the
//! wrapper emits.

use std::fmt::Write as _;

use crate::foundation::core::Rect;
use crate::sheet::document::{SVG_NS, XLINK_NS};

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

pub(crate) fn escape_xml_into(out: &mut String, text: &str) {
    let mut start = 0usize;
    for (i, b) in text.bytes().enumerate() {
        let esc = match b {
            b'&' => "&amp;",
            b'<' => "&lt;",
            b'>' => "&gt;",
            b'"' => "&quot;",
            _ => continue,
        };
        out.push_str(&text[start..i]);
        out.push_str(esc);
        start = i + 1;
    }
    out.push_str(&text[start..]);
}

/// Prefixed namespace declarations to emit on a wrapper root, in first-seen order.
#[derive(Clone, Debug, Default)]
pub struct Namespaces {
    decls: Vec<(String, String)>,
}

impl Namespaces {
    /// Start from the declarations in scope on `root`, always including `xlink`.
    pub fn from_root(root: roxmltree::Node<'_, '_>) -> Self {
        let mut out = Self::default();
        out.insert("xlink", XLINK_NS);
        for ns in root.namespaces() {
            if let Some(prefix) = ns.name() {
                out.insert(prefix, ns.uri());
            }
        }
        out
    }

    fn insert(&mut self, prefix: &str, uri: &str) {
        if prefix == "xml" || self.decls.iter().any(|(p, _)| p == prefix) {
            return;
        }
        self.decls.push((prefix.to_string(), uri.to_string()));
    }

    /// Add every prefixed namespace in scope anywhere inside `node`.
    pub fn absorb(&mut self, node: roxmltree::Node<'_, '_>) {
        for n in node.descendants().filter(|n| n.is_element()) {
            for ns in n.namespaces() {
                if let Some(prefix) = ns.name() {
                    self.insert(prefix, ns.uri());
                }
            }
        }
    }

    fn prefix_for(&self, uri: &str) -> Option<&str> {
        self.decls
            .iter()
            .find(|(_, u)| u == uri)
            .map(|(p, _)| p.as_str())
    }

    fn write_decls(&self, out: &mut String) {
        let _ = write!(out, r#" xmlns="{SVG_NS}""#);
        for (prefix, uri) in &self.decls {
            let _ = write!(out, r#" xmlns:{prefix}=""#);
            escape_xml_into(out, uri);
            out.push('"');
        }
    }

    fn qualify_attr(&self, namespace: Option<&str>, local: &str) -> Option<String> {
        match namespace {
            None => Some(local.to_string()),
            Some(XML_NS) => Some(format!("xml:{local}")),
            Some(uri) => self.prefix_for(uri).map(|p| format!("{p}:{local}")),
        }
    }
}

/// Serialize `node` and its subtree. Comments and processing instructions are dropped.
///
/// Elements in a namespace without a prefix on the wrapper (XHTML inside `<foreignObject>`,
/// for example) get a default `xmlns` redeclaration instead.
pub fn write_node(out: &mut String, node: roxmltree::Node<'_, '_>, ns: &Namespaces) {
    write_scoped(out, node, ns, SVG_NS);
}

fn write_scoped(
    out: &mut String,
    node: roxmltree::Node<'_, '_>,
    ns: &Namespaces,
    default_ns: &str,
) {
    if node.is_text() {
        if let Some(text) = node.text() {
            escape_xml_into(out, text);
        }
        return;
    }
    if !node.is_element() {
        return;
    }

    let tag = node.tag_name();
    let (name, scope) = match tag.namespace() {
        Some(SVG_NS) => (tag.name().to_string(), SVG_NS),
        Some(uri) => match ns.prefix_for(uri) {
            Some(prefix) => (format!("{prefix}:{}", tag.name()), default_ns),
            None => (tag.name().to_string(), uri),
        },
        None => (tag.name().to_string(), default_ns),
    };

    out.push('<');
    out.push_str(&name);
    if scope != default_ns {
        out.push_str(r#" xmlns=""#);
        escape_xml_into(out, scope);
        out.push('"');
    }
    for attr in node.attributes() {
        let Some(attr_name) = ns.qualify_attr(attr.namespace(), attr.name()) else {
            tracing::warn!(
                element = tag.name(),
                attribute = attr.name(),
                namespace = attr.namespace().unwrap_or(""),
                "dropping attribute in undeclared namespace"
            );
            continue;
        };
        let _ = write!(out, r#" {attr_name}=""#);
        escape_xml_into(out, attr.value());
        out.push('"');
    }

    if !node.has_children() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in node.children() {
        write_scoped(out, child, ns, scope);
    }
    let _ = write!(out, "</{name}>");
}

/// Format a coordinate without a trailing `.0` for whole numbers.
pub(crate) fn fmt_num(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let v = if v == 0.0 { 0.0 } else { v };
    format!("{v}")
}

/// Options for [`write_document`].
#[derive(Clone, Copy, Debug)]
pub struct DocumentFrame {
    pub view_box: Rect,
    pub width: f64,
    pub height: f64,
    /// Wrap the body nodes in an extra `<g>`.
    pub wrap_group: bool,
}

/// Build a standalone SVG document from shared resources and body nodes.
pub fn write_document<'a, 'input: 'a>(
    frame: DocumentFrame,
    ns: &Namespaces,
    shared: &[roxmltree::Node<'a, 'input>],
    body: impl IntoIterator<Item = roxmltree::Node<'a, 'input>>,
) -> String {
    let vb = frame.view_box;
    let mut out = String::new();
    out.push_str("<svg");
    ns.write_decls(&mut out);
    let _ = write!(
        out,
        r#" viewBox="{} {} {} {}" width="{}" height="{}">"#,
        fmt_num(vb.x0),
        fmt_num(vb.y0),
        fmt_num(vb.width()),
        fmt_num(vb.height()),
        fmt_num(frame.width),
        fmt_num(frame.height),
    );
    for node in shared {
        write_node(&mut out, *node, ns);
    }
    if frame.wrap_group {
        out.push_str("<g>");
    }
    for node in body {
        write_node(&mut out, node, ns);
    }
    if frame.wrap_group {
        out.push_str("</g>");
    }
    out.push_str("</svg>");
    out
}

#[cfg(test)]
#[path = "../../tests/unit/sheet/writer.rs"]
mod tests;
