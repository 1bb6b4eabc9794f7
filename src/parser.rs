//! Loading serialized token trees and splitting value text
//!
//! Token trees come from an external parser. They are accepted either as a
//! bare JSON array of tokens or as a document object carrying an optional
//! default grid. JSON5 extensions (comments, trailing commas, unquoted keys)
//! are allowed.

use serde::Deserialize;
use std::io::Read;
use thiserror::Error;

use crate::models::{GridSize, Token};
use crate::properties::parse_grid;

/// Error type for token loading failures.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid token tree: {message}")]
pub struct ParseError {
    pub message: String,
}

/// A loaded token tree plus the grid size it asks for, if any.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TokenDocument {
    pub tokens: Vec<Token>,
    pub grid: Option<GridSize>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DocumentRepr {
    Tokens(Vec<Token>),
    Document {
        #[serde(default)]
        grid: Option<String>,
        tokens: Vec<Token>,
    },
}

/// Parse a token tree from JSON or JSON5 text.
pub fn parse_tokens(source: &str) -> Result<TokenDocument, ParseError> {
    let repr: DocumentRepr =
        json5::from_str(source).map_err(|e| ParseError { message: e.to_string() })?;

    Ok(match repr {
        DocumentRepr::Tokens(tokens) => TokenDocument { tokens, grid: None },
        DocumentRepr::Document { grid, tokens } => {
            TokenDocument { tokens, grid: grid.as_deref().map(parse_grid) }
        }
    })
}

/// Read and parse a token tree from any reader.
pub fn read_tokens<R: Read>(mut reader: R) -> Result<TokenDocument, ParseError> {
    let mut source = String::new();
    reader.read_to_string(&mut source).map_err(|e| ParseError { message: e.to_string() })?;
    parse_tokens(&source)
}

/// Split text at top-level commas.
///
/// Commas nested inside parentheses or quotes do not split. Parts are
/// trimmed and empty parts dropped, so `"a, rgb(1, 2, 3),"` yields
/// `["a", "rgb(1, 2, 3)"]`.
pub fn split_value_group(input: &str) -> Vec<String> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut paren_depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escape_next = false;

    for c in input.chars() {
        if escape_next {
            escape_next = false;
            current.push(c);
            continue;
        }

        match c {
            '\\' => {
                escape_next = true;
                current.push(c);
            }
            '"' | '\'' => {
                match quote {
                    Some(q) if q == c => quote = None,
                    None => quote = Some(c),
                    _ => {}
                }
                current.push(c);
            }
            '(' if quote.is_none() => {
                paren_depth += 1;
                current.push(c);
            }
            ')' if quote.is_none() => {
                paren_depth = paren_depth.saturating_sub(1);
                current.push(c);
            }
            ',' if quote.is_none() && paren_depth == 0 => {
                push_trimmed(&mut groups, &current);
                current.clear();
            }
            _ => current.push(c),
        }
    }
    push_trimmed(&mut groups, &current);

    groups
}

/// Split text at top-level whitespace, keeping parenthesized and quoted
/// runs whole: `"1s cubic-bezier(0, 1, 1, 0) spin"` has three words.
pub fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut paren_depth = 0usize;
    let mut quote: Option<char> = None;

    for c in input.chars() {
        match c {
            '"' | '\'' => {
                match quote {
                    Some(q) if q == c => quote = None,
                    None => quote = Some(c),
                    _ => {}
                }
            }
            '(' if quote.is_none() => paren_depth += 1,
            ')' if quote.is_none() => paren_depth = paren_depth.saturating_sub(1),
            c if c.is_whitespace() && quote.is_none() && paren_depth == 0 => {
                push_trimmed(&mut words, &current);
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    push_trimmed(&mut words, &current);

    words
}

fn push_trimmed(groups: &mut Vec<String>, part: &str) {
    let trimmed = part.trim();
    if !trimmed.is_empty() {
        groups.push(trimmed.to_string());
    }
}
