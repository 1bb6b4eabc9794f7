//! doodlecss - Compile doodle token trees into grid CSS
//!
//! This library provides functionality to:
//! - Load token trees produced by an external parser (JSON or JSON5)
//! - Expand them over a grid of cells, evaluating value and selector functions
//! - Render the collected rules as CSS or JSON

pub mod cell;
pub mod cli;
pub mod compile;
pub mod compose;
pub mod config;
pub mod expression;
pub mod functions;
pub mod generator;
pub mod models;
pub mod output;
pub mod parser;
pub mod prefixer;
pub mod properties;
pub mod selector;
pub mod shapes;
pub mod watch;

pub use functions::{FunctionError, FunctionRegistry, SelectorRegistry};
pub use generator::Generator;
pub use models::{GridSize, Output, Props, Styles, Token};
pub use parser::{parse_tokens, ParseError, TokenDocument};
