//! Declaration composition.
//!
//! Post-processing runs in a fixed order: animation naming, content
//! quoting, the transition flag, vendor prefixes, the clip-path overflow
//! fix, cell size mirroring, then directives.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::cell::Cell;
use crate::functions::{parse_number_with_unit, FunctionError};
use crate::models::{GridSize, RuleToken};
use crate::parser::split_words;
use crate::properties::{TransformOptions, Transformed};
use crate::selector::{is_host_selector, is_special_selector, HOST_SELECTOR};

use super::Composer;

/// How a property name is handled by the rule composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    Animation,
    AnimationName,
    Content,
    Transition,
    ClipPath,
    /// `width` or `height`.
    Dimension,
    /// `@grid`
    Grid,
    /// `@place-cell`
    PlaceCell,
    /// `@use`
    Use,
    /// Any other `@` directive.
    Directive,
    Plain,
}

impl Property {
    pub fn classify(name: &str) -> Self {
        match name {
            "animation" => Property::Animation,
            "animation-name" => Property::AnimationName,
            "content" => Property::Content,
            "transition" => Property::Transition,
            "clip-path" => Property::ClipPath,
            "width" | "height" => Property::Dimension,
            "@grid" => Property::Grid,
            "@place-cell" => Property::PlaceCell,
            "@use" => Property::Use,
            n if n.starts_with('@') => Property::Directive,
            _ => Property::Plain,
        }
    }
}

const ANIMATION_KEYWORDS: &[&str] = &[
    "none", "infinite", "normal", "reverse", "alternate", "alternate-reverse", "forwards",
    "backwards", "both", "running", "paused", "linear", "ease", "ease-in", "ease-out",
    "ease-in-out", "step-start", "step-end", "initial", "inherit", "unset",
];

fn bare_content() -> &'static Regex {
    static BARE_CONTENT: OnceLock<Regex> = OnceLock::new();
    BARE_CONTENT.get_or_init(|| {
        Regex::new(r#"["']|^none$|^(var|counter|counters|attr)\("#)
            .unwrap_or_else(|err| panic!("invalid content regex: {err}"))
    })
}

impl<'a> Composer<'a> {
    /// Compose one declaration into CSS text for `selector`.
    ///
    /// `selector` is `None` for keyframe steps. The result may be empty,
    /// for example when a grid directive only has side effects.
    pub fn compose_rule(&mut self, token: &'a RuleToken, cell: &Cell, selector: Option<&str>) -> Result<String, FunctionError> {
        let property = token.property.as_str();
        let kind = Property::classify(property);
        let is_special = selector.map_or(false, is_special_selector);
        let is_host = selector.map_or(false, is_host_selector);

        let mut groups = Vec::with_capacity(token.value.len());
        for group in &token.value {
            let composed = self.compose_value(group, cell, &[])?;
            if !composed.is_empty() {
                groups.push(composed);
            }
        }

        let mut value = match kind {
            Property::Animation | Property::AnimationName => {
                self.props.has_animation = true;
                if cell.grid.count > 1 {
                    uniquify_animation(kind, &groups, cell.count)
                } else {
                    groups.join(", ")
                }
            }
            _ => groups.join(", "),
        };

        if kind == Property::Content && !bare_content().is_match(&value) {
            value = format!("'{}'", value);
        }
        if kind == Property::Transition {
            self.props.has_transition = true;
        }

        let mut rule = self.prefixer.prefix(property, &format!("{}: {};", property, value));
        if kind == Property::ClipPath {
            rule.push_str(" overflow: hidden;");
        }
        if kind == Property::Dimension && !is_special {
            rule.push_str(&format!(" --internal-cell-{}: {};", property, value));
        }

        if kind == Property::Use {
            if !token.styles.is_empty() {
                let discovering = self.discovering;
                self.walk(cell, &token.styles, discovering)?;
            }
            return Ok(self.properties.include(&token.value));
        }

        let options = TransformOptions { is_special_selector: is_special };
        Ok(match self.properties.transform(property, &value, options) {
            None => rule,
            Some(Transformed::Grid { grid, size }) => self.define_grid(&value, grid, size, is_host),
            Some(Transformed::Declaration(text)) if kind == Property::PlaceCell => {
                if is_host {
                    String::new()
                } else {
                    text
                }
            }
            Some(Transformed::Declaration(text)) => text,
        })
    }

    /// Apply a grid directive. On the host it always takes effect and its
    /// sizing text is emitted in place; elsewhere only the first one counts,
    /// and its sizing text moves to the host.
    fn define_grid(&mut self, value: &str, grid: GridSize, size: String, is_host: bool) -> String {
        if is_host {
            debug!(x = grid.x, y = grid.y, z = grid.z, "grid set on host");
            self.grid = Some(grid);
            self.is_grid_defined = true;
            self.is_host_grid = true;
            return size;
        }

        if !self.is_grid_defined {
            let options = TransformOptions { is_special_selector: true };
            let (grid, size) = match self.properties.transform("@grid", value, options) {
                Some(Transformed::Grid { grid, size }) => (grid, size),
                _ => (grid, size),
            };
            debug!(x = grid.x, y = grid.y, z = grid.z, "grid set from cell");
            self.grid = Some(grid);
            self.rules.push(HOST_SELECTOR, size);
        }
        self.is_grid_defined = true;
        String::new()
    }
}

/// Suffix every keyframe name referenced by an animation value with the
/// cell count, so each cell runs its own keyframes.
fn uniquify_animation(kind: Property, groups: &[String], count: u32) -> String {
    groups
        .iter()
        .map(|group| match kind {
            Property::AnimationName => suffix_name(group.trim(), count),
            _ => {
                let mut words = split_words(group);
                if let Some(name) = words.iter_mut().find(|w| is_animation_name(w)) {
                    *name = suffix_name(name, count);
                }
                words.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn suffix_name(name: &str, count: u32) -> String {
    if name.is_empty() || ANIMATION_KEYWORDS.contains(&name) {
        name.to_string()
    } else {
        format!("{}-{}", name, count)
    }
}

/// A shorthand word that is not a time, count, timing function or keyword.
fn is_animation_name(word: &str) -> bool {
    if ANIMATION_KEYWORDS.contains(&word) || word.contains('(') {
        return false;
    }
    match parse_number_with_unit(word) {
        Some((_, unit)) => !matches!(unit, "" | "s" | "ms"),
        None => true,
    }
}
