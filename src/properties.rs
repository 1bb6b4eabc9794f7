//! Property transform table
//!
//! Directive pseudo-properties (`@grid`, `@size`, `@place-cell`, ...) do not
//! map to one CSS declaration. The rule composer hands their composed value
//! to a [`PropertyTable`], which returns the text to emit or, for `@grid`,
//! the structured grid size.

use crate::models::{GridSize, ValueGroup};
use crate::parser::{split_value_group, split_words};
use crate::shapes;

/// Largest side of a 2-D grid.
pub const MAX_GRID_XY: u32 = 64;
/// Largest side of a single-row or single-column grid.
pub const MAX_GRID_LINE: u32 = 256;
/// Deepest layered grid.
pub const MAX_GRID_Z: u32 = 256;

const CELL_WIDTH: &str = "var(--internal-cell-width, 25%)";
const CELL_HEIGHT: &str = "var(--internal-cell-height, 25%)";

/// Context passed along with a directive value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformOptions {
    pub is_special_selector: bool,
}

/// Result of a directive transform.
#[derive(Debug, Clone, PartialEq)]
pub enum Transformed {
    /// Declaration text emitted in place of the directive.
    Declaration(String),
    /// A grid size, with the host sizing text that came along with it.
    Grid { grid: GridSize, size: String },
}

/// Lookup from property name to value transform.
pub trait PropertyTable {
    /// Transform a composed value. `None` means the table has no entry for
    /// `property` and the rule is emitted as a plain declaration.
    fn transform(&self, property: &str, value: &str, options: TransformOptions) -> Option<Transformed>;

    /// Text emitted for an inclusion directive, given its raw value groups.
    fn include(&self, _value: &[ValueGroup]) -> String {
        String::new()
    }
}

/// The builtin directive table.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultProperties;

impl PropertyTable for DefaultProperties {
    fn transform(&self, property: &str, value: &str, options: TransformOptions) -> Option<Transformed> {
        let text = match property {
            "@grid" => return Some(grid(value, options)),
            "@size" => size("width", "height", value, !options.is_special_selector),
            "@min-size" => size("min-width", "min-height", value, false),
            "@max-size" => size("max-width", "max-height", value, false),
            "@place-cell" => place_cell(value),
            "@shape" => shape(value),
            "@use" => String::new(),
            _ => return None,
        };
        Some(Transformed::Declaration(text))
    }
}

/// Parse grid text such as `5`, `4x3`, `1x1x20` or `8, 2`.
///
/// Each axis is clamped to its limits; a missing `y` copies `x`.
pub fn parse_grid(text: &str) -> GridSize {
    let normalized: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if matches!(c, ',' | 'X' | '，') { 'x' } else { c })
        .collect();
    let mut axes = normalized
        .split('x')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 1.0).map(|v| v as u32));

    let x = axes.next().flatten();
    let y = axes.next().flatten();
    let z = axes.next().flatten();

    let max_xy = if x == Some(1) || y == Some(1) { MAX_GRID_LINE } else { MAX_GRID_XY };
    let gx = x.unwrap_or(1).clamp(1, max_xy);
    let gy = y.or(x).unwrap_or(1).clamp(1, max_xy);
    let max_z = if gx == 1 && gy == 1 { MAX_GRID_Z } else { 1 };
    let gz = z.unwrap_or(1).clamp(1, max_z);

    GridSize::new(gx, gy, gz)
}

fn grid(value: &str, options: TransformOptions) -> Transformed {
    let (grid_text, size_text) = match value.split_once('/') {
        Some((g, s)) => (g.trim(), s.trim()),
        None => (value.trim(), ""),
    };
    let size = if size_text.is_empty() {
        String::new()
    } else {
        self::size("width", "height", size_text, !options.is_special_selector)
    };
    Transformed::Grid { grid: parse_grid(grid_text), size }
}

/// Two-axis sizing: `w [h]`, with `h` defaulting to `w`.
fn size(width_prop: &str, height_prop: &str, value: &str, mirror: bool) -> String {
    let parts = split_axes(value);
    let Some(w) = parts.first() else {
        return String::new();
    };
    let h = parts.get(1).unwrap_or(w);
    let mut text = format!("{}: {}; {}: {};", width_prop, w, height_prop, h);
    if mirror {
        text.push_str(&format!(" --internal-cell-{}: {}; --internal-cell-{}: {};", width_prop, w, height_prop, h));
    }
    text
}

fn place_cell(value: &str) -> String {
    let parts = split_axes(value);
    let Some(left) = parts.first() else {
        return String::new();
    };
    let top = parts.get(1).unwrap_or(left);
    let left = match left.as_str() {
        "center" | "top" | "bottom" => "50%",
        "left" => "0%",
        "right" => "100%",
        other => other,
    };
    let top = match top.as_str() {
        "center" | "left" | "right" => "50%",
        "top" => "0%",
        "bottom" => "100%",
        other => other,
    };
    format!(
        "position: absolute; left: {}; top: {}; width: {cw}; height: {ch}; \
         margin-left: calc({cw} / -2) !important; margin-top: calc({ch} / -2) !important; \
         grid-area: unset !important;",
        left,
        top,
        cw = CELL_WIDTH,
        ch = CELL_HEIGHT,
    )
}

fn shape(value: &str) -> String {
    let parts = split_value_group(value);
    let Some((name, args)) = parts.split_first() else {
        return String::new();
    };
    // `@shape: star` and `@shape: siogon 6` are both accepted
    let mut words = name.split_whitespace();
    let name = words.next().unwrap_or_default();
    let mut args: Vec<String> = words.map(str::to_string).chain(args.iter().cloned()).collect();
    args.retain(|a| !a.is_empty());
    match shapes::shape(name, &args) {
        Some(path) => format!("clip-path: {};", path),
        None => String::new(),
    }
}

/// Split `a b` or `a, b` into axis values.
fn split_axes(value: &str) -> Vec<String> {
    let parts = split_value_group(value);
    if parts.len() > 1 {
        return parts;
    }
    split_words(value)
}
