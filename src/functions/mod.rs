//! Function registries
//!
//! Value functions come in two calling conventions, chosen per entry:
//!
//! - [`Callable::Eager`] receives its arguments already composed into text.
//! - [`Callable::Lazy`] receives [`LazyArg`] thunks and decides itself how
//!   many times, and with which injected inputs, each argument is evaluated.
//!
//! Lookups check custom functions before math functions. Selector
//! predicates, used by conditional blocks, live in their own registry.

mod builtin;
mod math;
mod selector;

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::cell::Call;

pub use selector::{matches_nth, parse_nth};

/// A registry function failed. Aborts the whole compilation.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("function '{name}' failed: {message}")]
pub struct FunctionError {
    pub name: String,
    pub message: String,
}

impl FunctionError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: name.into(), message: message.into() }
    }
}

/// Outcome of a value function; `None` contributes nothing to the value.
pub type FnResult = Result<Option<String>, FunctionError>;

pub type EagerFn = Box<dyn Fn(&Call<'_>, &[String]) -> FnResult>;
pub type LazyFn = Box<dyn Fn(&Call<'_>, &[LazyArg<'_>]) -> FnResult>;
pub type PredicateFn = Box<dyn Fn(&Call<'_>, &[String]) -> Result<bool, FunctionError>>;

/// A registered value function.
pub enum Callable {
    Eager(EagerFn),
    Lazy(LazyFn),
}

impl Callable {
    pub fn is_lazy(&self) -> bool {
        matches!(self, Callable::Lazy(_))
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Eager(_) => f.write_str("Callable::Eager"),
            Callable::Lazy(_) => f.write_str("Callable::Lazy"),
        }
    }
}

/// A deferred argument handed to lazy functions.
///
/// Each [`eval`](LazyArg::eval) composes the argument afresh, with `extra`
/// visible to every function nested inside it.
pub struct LazyArg<'a> {
    thunk: Box<dyn Fn(&[String]) -> Result<String, FunctionError> + 'a>,
}

impl<'a> LazyArg<'a> {
    pub fn new(thunk: impl Fn(&[String]) -> Result<String, FunctionError> + 'a) -> Self {
        Self { thunk: Box::new(thunk) }
    }

    pub fn eval(&self, extra: &[String]) -> Result<String, FunctionError> {
        (self.thunk)(extra)
    }
}

/// Named value functions: custom entries first, then math.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    custom: HashMap<String, Callable>,
    math: HashMap<String, Callable>,
}

impl FunctionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the builtin custom and math functions.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtin::register(&mut registry);
        math::register(&mut registry);
        registry
    }

    pub fn register_eager<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&Call<'_>, &[String]) -> FnResult + 'static,
    {
        self.custom.insert(name.to_string(), Callable::Eager(Box::new(f)));
    }

    pub fn register_lazy<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&Call<'_>, &[LazyArg<'_>]) -> FnResult + 'static,
    {
        self.custom.insert(name.to_string(), Callable::Lazy(Box::new(f)));
    }

    pub fn register_math<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&Call<'_>, &[String]) -> FnResult + 'static,
    {
        self.math.insert(name.to_string(), Callable::Eager(Box::new(f)));
    }

    /// Resolve a function by name (without the `@` marker).
    pub fn get(&self, name: &str) -> Option<&Callable> {
        self.custom.get(name).or_else(|| self.math.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Sorted custom function names.
    pub fn custom_names(&self) -> Vec<&str> {
        sorted_keys(&self.custom)
    }

    /// Sorted math function names.
    pub fn math_names(&self) -> Vec<&str> {
        sorted_keys(&self.math)
    }
}

/// Named selector predicates for conditional blocks.
#[derive(Default)]
pub struct SelectorRegistry {
    predicates: HashMap<String, PredicateFn>,
}

impl SelectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        selector::register(&mut registry);
        registry
    }

    pub fn register<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&Call<'_>, &[String]) -> Result<bool, FunctionError> + 'static,
    {
        self.predicates.insert(name.to_string(), Box::new(f));
    }

    pub fn get(&self, name: &str) -> Option<&PredicateFn> {
        self.predicates.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        sorted_keys(&self.predicates)
    }
}

impl fmt::Debug for SelectorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectorRegistry").field("predicates", &self.names()).finish()
    }
}

fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<&str> {
    let mut names: Vec<&str> = map.keys().map(|k| k.as_str()).collect();
    names.sort_unstable();
    names
}

/// Format a number the way CSS text expects it (`2`, `0.5`).
///
/// Non-finite values have no CSS form and yield `None`.
pub fn format_number(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    if value == 0.0 {
        // avoid "-0"
        return Some("0".to_string());
    }
    Some(value.to_string())
}

/// Split a CSS number into its numeric part and unit (`"10px"` -> `(10.0, "px")`).
pub fn parse_number_with_unit(text: &str) -> Option<(f64, &str)> {
    let text = text.trim();
    let end = text
        .char_indices()
        .find(|&(i, c)| !is_number_char(text, i, c))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let number = text[..end].parse::<f64>().ok()?;
    Some((number, &text[end..]))
}

fn is_number_char(text: &str, i: usize, c: char) -> bool {
    match c {
        '0'..='9' | '.' => true,
        '-' | '+' => i == 0,
        // exponent only when a digit follows, so `3em` keeps its unit
        'e' | 'E' => i > 0 && text[i + 1..].starts_with(|n: char| n.is_ascii_digit()),
        _ => false,
    }
}
