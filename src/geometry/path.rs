//! SVG path data (`d` attribute) point extraction.
//!
//! Curves are not flattened: every control point is emitted alongside the endpoint, so the
//! bounds of the returned points always contain the true curve (the convex hull property of
//! Bézier segments), at the cost of some slack around strongly bent curves.

use crate::foundation::core::{Affine, Point, Rect, bounds_of_points};

#[derive(Clone, Copy, Debug, PartialEq)]
enum Token {
    Command(u8),
    Number(f64),
}

fn tokenize(d: &str) -> Vec<Token> {
    let bytes = d.as_bytes();
    let mut out = Vec::new();
    let mut i = 0usize;
    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_whitespace() || b == b',' {
            i += 1;
            continue;
        }
        if b.is_ascii_digit() || b == b'.' || b == b'-' || b == b'+' {
            let (end, value) = lex_number(bytes, i);
            match value {
                Some(v) => out.push(Token::Number(v)),
                None => tracing::debug!(offset = i, "skipping malformed number in path data"),
            }
            i = end.max(i + 1);
            continue;
        }
        if b.is_ascii_alphabetic() {
            out.push(Token::Command(b));
        } else {
            tracing::debug!(offset = i, byte = b, "skipping unexpected byte in path data");
        }
        i += 1;
    }
    out
}

/// Lex one number starting at `start`. Returns the end offset and the parsed value.
fn lex_number(bytes: &[u8], start: usize) -> (usize, Option<f64>) {
    let mut i = start;
    if matches!(bytes.get(i), Some(b'-' | b'+')) {
        i += 1;
    }
    let mut seen_digit = false;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
        seen_digit = true;
    }
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
            seen_digit = true;
        }
    }
    if !seen_digit {
        return (i, None);
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'-' | b'+')) {
            j += 1;
        }
        if bytes.get(j).is_some_and(u8::is_ascii_digit) {
            while bytes.get(j).is_some_and(u8::is_ascii_digit) {
                j += 1;
            }
            i = j;
        }
    }
    let text = std::str::from_utf8(&bytes[start..i]).unwrap_or_default();
    (i, text.parse::<f64>().ok())
}

fn arity(cmd: u8) -> Option<usize> {
    match cmd.to_ascii_uppercase() {
        b'Z' => Some(0),
        b'H' | b'V' => Some(1),
        b'M' | b'L' | b'T' => Some(2),
        b'S' | b'Q' => Some(4),
        b'C' => Some(6),
        b'A' => Some(7),
        _ => None,
    }
}

/// Pen state carried across the segments of one `d` string.
#[derive(Clone, Copy, Debug, Default)]
struct PathCursor {
    current: Point,
    subpath_start: Point,
    last_cubic_ctrl: Option<Point>,
    last_quad_ctrl: Option<Point>,
}

impl PathCursor {
    fn resolve(&self, relative: bool, x: f64, y: f64) -> Point {
        if relative {
            Point::new(self.current.x + x, self.current.y + y)
        } else {
            Point::new(x, y)
        }
    }

    fn reflect(&self, ctrl: Option<Point>) -> Point {
        match ctrl {
            Some(c) => Point::new(2.0 * self.current.x - c.x, 2.0 * self.current.y - c.y),
            None => self.current,
        }
    }

    /// Apply one segment, pushing the points it contributes.
    fn step(&mut self, cmd: u8, args: &[f64], out: &mut Vec<Point>) {
        let relative = cmd.is_ascii_lowercase();
        let mut cubic_ctrl = None;
        let mut quad_ctrl = None;
        match cmd.to_ascii_uppercase() {
            b'M' => {
                let p = self.resolve(relative, args[0], args[1]);
                out.push(p);
                self.current = p;
                self.subpath_start = p;
            }
            b'L' => {
                let p = self.resolve(relative, args[0], args[1]);
                out.push(p);
                self.current = p;
            }
            b'H' => {
                let x = if relative { self.current.x + args[0] } else { args[0] };
                let p = Point::new(x, self.current.y);
                out.push(p);
                self.current = p;
            }
            b'V' => {
                let y = if relative { self.current.y + args[0] } else { args[0] };
                let p = Point::new(self.current.x, y);
                out.push(p);
                self.current = p;
            }
            b'C' => {
                let c1 = self.resolve(relative, args[0], args[1]);
                let c2 = self.resolve(relative, args[2], args[3]);
                let p = self.resolve(relative, args[4], args[5]);
                out.extend([c1, c2, p]);
                cubic_ctrl = Some(c2);
                self.current = p;
            }
            b'S' => {
                let c1 = self.reflect(self.last_cubic_ctrl);
                let c2 = self.resolve(relative, args[0], args[1]);
                let p = self.resolve(relative, args[2], args[3]);
                out.extend([c1, c2, p]);
                cubic_ctrl = Some(c2);
                self.current = p;
            }
            b'Q' => {
                let c = self.resolve(relative, args[0], args[1]);
                let p = self.resolve(relative, args[2], args[3]);
                out.extend([c, p]);
                quad_ctrl = Some(c);
                self.current = p;
            }
            b'T' => {
                let c = self.reflect(self.last_quad_ctrl);
                let p = self.resolve(relative, args[0], args[1]);
                out.extend([c, p]);
                quad_ctrl = Some(c);
                self.current = p;
            }
            b'A' => {
                // Radii, rotation and flags are consumed; only the endpoint is kept.
                let p = self.resolve(relative, args[5], args[6]);
                out.push(p);
                self.current = p;
            }
            b'Z' => {
                self.current = self.subpath_start;
            }
            _ => {}
        }
        self.last_cubic_ctrl = cubic_ctrl;
        self.last_quad_ctrl = quad_ctrl;
    }
}

/// Extract the end and control points of a path, in drawing order.
///
/// Unknown commands and truncated argument groups are skipped. The pen state starts at the
/// origin on every call.
pub fn extract_points(d: &str) -> Vec<Point> {
    let tokens = tokenize(d);
    let mut out = Vec::new();
    let mut cursor = PathCursor::default();
    let mut i = 0usize;

    while i < tokens.len() {
        let cmd = match tokens[i] {
            Token::Command(c) => c,
            Token::Number(_) => {
                tracing::debug!(index = i, "skipping number without a preceding command");
                i += 1;
                continue;
            }
        };
        i += 1;

        let mut args = Vec::new();
        while let Some(Token::Number(v)) = tokens.get(i) {
            args.push(*v);
            i += 1;
        }

        let Some(n) = arity(cmd) else {
            tracing::debug!(command = %char::from(cmd), "skipping unknown path command");
            continue;
        };
        if n == 0 {
            cursor.step(cmd, &[], &mut out);
            continue;
        }
        if args.len() < n {
            tracing::debug!(command = %char::from(cmd), "skipping truncated path segment");
            continue;
        }

        let mut seg_cmd = cmd;
        let mut chunks = args.chunks_exact(n);
        for chunk in chunks.by_ref() {
            cursor.step(seg_cmd, chunk, &mut out);
            // Extra coordinate pairs after a moveto are implicit linetos.
            seg_cmd = match seg_cmd {
                b'M' => b'L',
                b'm' => b'l',
                c => c,
            };
        }
        if !chunks.remainder().is_empty() {
            tracing::debug!(command = %char::from(cmd), "dropping trailing partial segment");
        }
    }
    out
}

/// Bounds of a path's points after mapping them through `m`. `None` when no point was found.
pub fn bbox_of_path(d: &str, m: Affine) -> Option<Rect> {
    bounds_of_points(extract_points(d).into_iter().map(|p| m * p))
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/path.rs"]
mod tests;
