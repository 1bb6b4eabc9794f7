//! Per-cell evaluation environment
//!
//! A [`Cell`] is created once per grid coordinate. Every cell of one
//! expansion pass shares a single [`SharedContext`], which stateful
//! functions use to carry values from one cell to the next.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::models::GridSize;

/// Seed used when the caller does not pick one.
pub const DEFAULT_SEED: u64 = 0x5EED_D00D_1E55_0001;

/// A simple deterministic PRNG (xorshift64) so seeded runs reproduce exactly.
#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        // xorshift never leaves the zero state
        Self { state: if seed == 0 { DEFAULT_SEED } else { seed } }
    }

    /// Generate next u64 value.
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Generate a random f64 in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Generate a random f64 in [min, max).
    pub fn range(&mut self, min: f64, max: f64) -> f64 {
        min + (max - min) * self.next_f64()
    }

    /// Generate a random index in [0, len). `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        (self.next_u64() % len as u64) as usize
    }
}

impl Default for Rng {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

#[derive(Debug, Default)]
struct ContextState {
    values: HashMap<String, String>,
    counters: HashMap<String, usize>,
    rng: Rng,
}

/// Mutable state shared by every cell of one expansion pass.
///
/// Cloning yields another handle onto the same state. Independent
/// compilations each create their own context.
#[derive(Debug, Clone, Default)]
pub struct SharedContext(Rc<RefCell<ContextState>>);

impl SharedContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: u64) -> Self {
        let state = ContextState { rng: Rng::new(seed), ..Default::default() };
        Self(Rc::new(RefCell::new(state)))
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.0.borrow().values.get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.0.borrow_mut().values.insert(key.into(), value.into());
    }

    /// Return the current value of a named counter, then advance it.
    pub fn next_counter(&self, key: &str) -> usize {
        let mut state = self.0.borrow_mut();
        let counter = state.counters.entry(key.to_string()).or_insert(0);
        let current = *counter;
        *counter += 1;
        current
    }

    /// Draw a random f64 in [0.0, 1.0) from the shared generator.
    pub fn random(&self) -> f64 {
        self.0.borrow_mut().rng.next_f64()
    }

    /// Draw a random f64 in [min, max).
    pub fn random_range(&self, min: f64, max: f64) -> f64 {
        self.0.borrow_mut().rng.range(min, max)
    }

    /// Draw a random index in [0, len). Returns `None` for `len == 0`.
    pub fn random_index(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.0.borrow_mut().rng.index(len))
    }
}

/// The coordinate context of one grid cell.
#[derive(Debug, Clone)]
pub struct Cell {
    pub x: u32,
    pub y: u32,
    pub z: u32,
    /// Flattened 1-indexed visiting order.
    pub count: u32,
    pub grid: GridSize,
    pub context: SharedContext,
}

impl Cell {
    pub fn new(x: u32, y: u32, z: u32, count: u32, grid: GridSize, context: SharedContext) -> Self {
        Self { x, y, z, count, grid, context }
    }

    /// The single cell used while discovering the grid size.
    pub fn discovery() -> Self {
        Self::new(1, 1, 1, 1, GridSize::default(), SharedContext::new())
    }
}

/// The transient call site of one function invocation.
///
/// `extra` carries positional inputs injected by a lazy caller (for example
/// the current repeat index); `position` is the call's source offset.
#[derive(Debug, Clone, Copy)]
pub struct Call<'a> {
    pub cell: &'a Cell,
    pub position: usize,
    pub extra: &'a [String],
}

impl<'a> Call<'a> {
    pub fn new(cell: &'a Cell, position: usize, extra: &'a [String]) -> Self {
        Self { cell, position, extra }
    }

    pub fn context(&self) -> &SharedContext {
        &self.cell.context
    }
}
