//! Composition engine
//!
//! A [`Composer`] holds the state of one compilation run: the rule store,
//! the keyframe store, side-channel props, the discovered grid and the
//! history of visited cells. The generator drives it once for discovery
//! and once per cell for expansion.
//!
//! - `value` composes value groups and function arguments
//! - `rule` turns one declaration into CSS text
//! - `walk` walks the token tree for one cell

mod rule;
mod value;
mod walk;

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::cell::Cell;
use crate::functions::{FunctionRegistry, SelectorRegistry};
use crate::models::{GridSize, KeyframesToken, Props, PseudoToken};
use crate::prefixer::Prefixer;
use crate::properties::PropertyTable;
use crate::selector::is_cell_selector;

pub use rule::Property;

/// Selector to declarations, in first-insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleStore {
    order: Vec<String>,
    rules: HashMap<String, Vec<String>>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a declaration to a selector's bucket. Empty text is dropped.
    pub fn push(&mut self, selector: &str, declaration: String) {
        if declaration.is_empty() {
            return;
        }
        match self.rules.get_mut(selector) {
            Some(bucket) => bucket.push(declaration),
            None => {
                self.order.push(selector.to_string());
                self.rules.insert(selector.to_string(), vec![declaration]);
            }
        }
    }

    pub fn get(&self, selector: &str) -> Option<&[String]> {
        self.rules.get(selector).map(|r| r.as_slice())
    }

    /// Buckets in the order their selectors were first seen.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.order
            .iter()
            .filter_map(|s| self.rules.get(s).map(|r| (s.as_str(), r.as_slice())))
    }

    /// Drop every per-cell bucket, keeping host and container ones.
    pub fn drop_cells(&mut self) {
        self.order.retain(|s| !is_cell_selector(s));
        self.rules.retain(|s, _| !is_cell_selector(s));
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Keyframes definitions by name; the first registration of a name wins.
#[derive(Debug, Clone, Default)]
pub struct KeyframeStore<'a> {
    entries: Vec<&'a KeyframesToken>,
}

impl<'a> KeyframeStore<'a> {
    /// Returns `false` when the name was already registered.
    pub fn register(&mut self, token: &'a KeyframesToken) -> bool {
        if self.contains(&token.name) {
            return false;
        }
        self.entries.push(token);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|k| k.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a KeyframesToken> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// State of one compilation run.
pub struct Composer<'a> {
    functions: &'a FunctionRegistry,
    selectors: &'a SelectorRegistry,
    properties: &'a dyn PropertyTable,
    prefixer: &'a dyn Prefixer,
    rules: RuleStore,
    keyframes: KeyframeStore<'a>,
    props: Props,
    grid: Option<GridSize>,
    /// A grid directive was seen on a non-host selector (or the host).
    is_grid_defined: bool,
    /// A grid directive was seen on the host; it beats every other one.
    is_host_grid: bool,
    discovering: bool,
    history: Vec<Cell>,
    /// Special pseudo blocks already emitted; they are cell-independent.
    processed: HashSet<*const PseudoToken>,
}

impl<'a> Composer<'a> {
    pub fn new(
        functions: &'a FunctionRegistry,
        selectors: &'a SelectorRegistry,
        properties: &'a dyn PropertyTable,
        prefixer: &'a dyn Prefixer,
    ) -> Self {
        Self {
            functions,
            selectors,
            properties,
            prefixer,
            rules: RuleStore::new(),
            keyframes: KeyframeStore::default(),
            props: Props::default(),
            grid: None,
            is_grid_defined: false,
            is_host_grid: false,
            discovering: false,
            history: Vec::new(),
            processed: HashSet::new(),
        }
    }

    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    pub fn keyframes(&self) -> &KeyframeStore<'a> {
        &self.keyframes
    }

    pub fn props(&self) -> Props {
        self.props
    }

    /// Grid size set by a grid directive, if any was composed.
    pub fn grid(&self) -> Option<GridSize> {
        self.grid
    }

    /// Cells visited since the last reset, in order.
    pub fn history(&self) -> &[Cell] {
        &self.history
    }

    /// Clear per-cell state between the discovery and expansion passes.
    ///
    /// Host and container buckets, registered keyframes, props and the grid
    /// survive: special blocks are only ever composed once.
    pub fn reset_cells(&mut self) {
        debug!(kept = self.rules.len(), "resetting per-cell rules");
        self.rules.drop_cells();
        self.history.clear();
    }
}
