//! Selector composition and classification
//!
//! Cells are addressed by a synthesized id selector. Host (`:host`,
//! `:doodle`) and container (`:container`, `:parent`) selectors are
//! "special": they address the whole component or its wrapper once, never
//! a single cell.

use std::borrow::Cow;

use crate::cell::Cell;

/// Canonical host selector.
pub const HOST_SELECTOR: &str = ":host";

/// Class name the container rules are emitted under.
pub const CONTAINER_CLASS: &str = ".container";

const HOST_PREFIXES: [&str; 2] = [":host", ":doodle"];
const PARENT_PREFIXES: [&str; 2] = [":container", ":parent"];

/// Deterministic id of the cell at `(x, y, z)`.
pub fn cell_id(x: u32, y: u32, z: u32) -> String {
    format!("cell-{}-{}-{}", x, y, z)
}

/// Selector addressing one cell, with an optional pseudo suffix.
pub fn compose_selector(cell: &Cell, pseudo: Option<&str>) -> String {
    format!("#{}{}", cell_id(cell.x, cell.y, cell.z), pseudo.unwrap_or(""))
}

/// True for selectors produced by [`compose_selector`].
pub fn is_cell_selector(selector: &str) -> bool {
    selector.starts_with("#cell-")
}

pub fn is_host_selector(selector: &str) -> bool {
    HOST_PREFIXES.iter().any(|p| selector.starts_with(p))
}

pub fn is_parent_selector(selector: &str) -> bool {
    PARENT_PREFIXES.iter().any(|p| selector.starts_with(p))
}

pub fn is_special_selector(selector: &str) -> bool {
    is_host_selector(selector) || is_parent_selector(selector)
}

/// Rewrite the `:doodle` alias (with any number of leading colons) to `:host`.
pub fn normalize_host_alias(selector: &str) -> Cow<'_, str> {
    if !selector.starts_with(":doodle") && !selector.starts_with("::doodle") {
        return Cow::Borrowed(selector);
    }
    let rest = selector.trim_start_matches(':');
    match rest.strip_prefix("doodle") {
        Some(tail) => Cow::Owned(format!("{}{}", HOST_SELECTOR, tail)),
        None => Cow::Borrowed(selector),
    }
}
