//! Configuration module for doodlecss
//!
//! Provides types, discovery and loading for `doodle.toml`.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
