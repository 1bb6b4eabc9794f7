//! Value and argument composition.

use tracing::warn;

use crate::cell::{Call, Cell};
use crate::functions::{Callable, FnResult, FunctionError, LazyArg};
use crate::models::{Argument, FuncNode, ValueNode};
use crate::parser::split_value_group;

use super::Composer;

impl<'a> Composer<'a> {
    /// Compose a value group into one string, left to right.
    ///
    /// Text nodes are copied verbatim. Function nodes contribute their
    /// result, or nothing when the function is unknown or returns `None`.
    pub fn compose_value(&self, group: &[ValueNode], cell: &Cell, extra: &[String]) -> Result<String, FunctionError> {
        let mut value = String::new();
        for node in group {
            if let Some(text) = self.compose_node(node, cell, extra)? {
                value.push_str(&text);
            }
        }
        Ok(value)
    }

    fn compose_node(&self, node: &ValueNode, cell: &Cell, extra: &[String]) -> FnResult {
        match node {
            ValueNode::Text { value } => Ok(Some(value.clone())),
            ValueNode::Func(func) => self.call_function(func, cell, extra),
        }
    }

    fn call_function(&self, func: &FuncNode, cell: &Cell, extra: &[String]) -> FnResult {
        let name = func.lookup_name();
        let Some(callable) = self.functions.get(name) else {
            warn!("unknown function '{}'", name);
            return Ok(None);
        };
        let call = Call::new(cell, func.position, extra);

        match callable {
            Callable::Eager(f) => {
                let mut args = Vec::with_capacity(func.arguments.len());
                for argument in &func.arguments {
                    args.extend(self.compose_argument(argument, cell, extra)?);
                }
                f(&call, &args)
            }
            Callable::Lazy(f) => {
                let args: Vec<LazyArg<'_>> = func
                    .arguments
                    .iter()
                    .map(|argument| {
                        LazyArg::new(move |inner: &[String]| {
                            // an empty injection keeps the caller's inputs visible
                            let extra = if inner.is_empty() { extra } else { inner };
                            self.compose_value(&argument.nodes, cell, extra)
                        })
                    })
                    .collect();
                f(&call, &args)
            }
        }
    }

    /// Compose one argument into the positional inputs it provides.
    ///
    /// Several nodes make a cluster, concatenated into a single input. A
    /// single textual result is re-split at top-level commas so a function
    /// can return a list for its caller to spread. Empty inputs are dropped.
    pub fn compose_argument(&self, argument: &Argument, cell: &Cell, extra: &[String]) -> Result<Vec<String>, FunctionError> {
        let mut parts = Vec::with_capacity(argument.nodes.len());
        for node in &argument.nodes {
            parts.push(self.compose_node(node, cell, extra)?);
        }

        if argument.cluster || parts.len() >= 2 {
            let joined: String = parts.into_iter().flatten().collect();
            return Ok(if joined.is_empty() { Vec::new() } else { vec![joined] });
        }
        Ok(match parts.into_iter().next().flatten() {
            Some(value) => split_value_group(&value),
            None => Vec::new(),
        })
    }
}
