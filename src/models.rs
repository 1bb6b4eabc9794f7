//! Data models for doodle token trees and compilation results
//!
//! Tokens are produced by an external parser and arrive here already
//! structured. They are immutable for the whole compilation run.

use serde::{Deserialize, Serialize};

/// One value expression: an ordered sequence of text and function nodes.
pub type ValueGroup = Vec<ValueNode>;

/// A node of the token tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Token {
    Rule(RuleToken),
    Pseudo(PseudoToken),
    Cond(CondToken),
    Keyframes(KeyframesToken),
}

/// A declaration: `property: value[, value...]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleToken {
    pub property: String,
    #[serde(default)]
    pub value: Vec<ValueGroup>,
    /// Nested tokens carried by inclusion directives (`@use`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub styles: Vec<Token>,
}

impl RuleToken {
    /// Build a declaration whose value is plain text.
    pub fn text(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: vec![vec![ValueNode::text(value)]],
            styles: Vec::new(),
        }
    }
}

/// A block scoped to a pseudo-selector such as `:hover` or `:host`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PseudoToken {
    pub selector: String,
    #[serde(default)]
    pub styles: Vec<RuleToken>,
}

/// A conditional block guarded by a selector predicate such as `@nth(2n)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CondToken {
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<Argument>,
    #[serde(default)]
    pub styles: Vec<Token>,
}

/// A keyframes definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyframesToken {
    pub name: String,
    #[serde(default)]
    pub steps: Vec<KeyframeStep>,
}

/// One keyframe stop (`0%`, `from`, ...) and its declarations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyframeStep {
    pub name: String,
    #[serde(default)]
    pub styles: Vec<RuleToken>,
}

/// Element of a value group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ValueNode {
    Text { value: String },
    Func(FuncNode),
}

impl ValueNode {
    pub fn text(value: impl Into<String>) -> Self {
        ValueNode::Text { value: value.into() }
    }

    pub fn func(name: impl Into<String>, arguments: Vec<Argument>) -> Self {
        ValueNode::Func(FuncNode { name: name.into(), arguments, position: 0 })
    }
}

/// A function call node. Names keep their leading marker (`@r`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FuncNode {
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<Argument>,
    #[serde(default)]
    pub position: usize,
}

impl FuncNode {
    /// Registry lookup name, without the leading `@`.
    pub fn lookup_name(&self) -> &str {
        strip_marker(&self.name)
    }
}

/// Remove the function marker from a name (`@nth` -> `nth`).
pub fn strip_marker(name: &str) -> &str {
    name.strip_prefix('@').unwrap_or(name)
}

/// A function argument: its own value expression.
///
/// Serialized either as a bare node array or as
/// `{ "cluster": true, "value": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(from = "ArgumentRepr")]
pub struct Argument {
    /// Set when the argument joins several sub-results.
    pub cluster: bool,
    #[serde(rename = "value")]
    pub nodes: Vec<ValueNode>,
}

impl Argument {
    pub fn new(nodes: Vec<ValueNode>) -> Self {
        Self { cluster: false, nodes }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(vec![ValueNode::text(value)])
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ArgumentRepr {
    Nodes(Vec<ValueNode>),
    Tagged {
        #[serde(default)]
        cluster: bool,
        value: Vec<ValueNode>,
    },
}

impl From<ArgumentRepr> for Argument {
    fn from(repr: ArgumentRepr) -> Self {
        match repr {
            ArgumentRepr::Nodes(nodes) => Argument { cluster: false, nodes },
            ArgumentRepr::Tagged { cluster, value } => Argument { cluster, nodes: value },
        }
    }
}

/// Grid dimensions. `count` is always `x * y * z`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct GridSize {
    pub x: u32,
    pub y: u32,
    pub z: u32,
    pub count: u32,
}

impl GridSize {
    pub fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z, count: x * y * z }
    }

    /// Grids with depth are walked as a single line of layers.
    pub fn is_layered(&self) -> bool {
        self.z > 1
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

/// Side-channel flags raised while composing rules.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Props {
    #[serde(default)]
    pub has_animation: bool,
    #[serde(default)]
    pub has_transition: bool,
}

/// The four independently concatenable CSS buffers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Styles {
    pub host: String,
    pub container: String,
    pub cells: String,
    pub keyframes: String,
}

impl Styles {
    /// Concatenate every buffer into one stylesheet.
    pub fn to_css(&self) -> String {
        [&self.host, &self.container, &self.cells, &self.keyframes]
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn clear(&mut self) {
        self.host.clear();
        self.container.clear();
        self.cells.clear();
        self.keyframes.clear();
    }
}

/// Result of one compilation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Output {
    pub props: Props,
    pub styles: Styles,
    pub grid: GridSize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_token_from_json() {
        let json = r#"{
            "type": "rule",
            "property": "color",
            "value": [[{ "type": "text", "value": "red" }]]
        }"#;
        let token: Token = serde_json::from_str(json).unwrap();
        assert_eq!(token, Token::Rule(RuleToken::text("color", "red")));
    }

    #[test]
    fn test_func_node_with_bare_argument() {
        let json = r#"{ "type": "func", "name": "@r", "arguments": [[{ "type": "text", "value": "10" }]], "position": 3 }"#;
        let node: ValueNode = serde_json::from_str(json).unwrap();
        match node {
            ValueNode::Func(func) => {
                assert_eq!(func.lookup_name(), "r");
                assert_eq!(func.position, 3);
                assert_eq!(func.arguments, vec![Argument::text("10")]);
                assert!(!func.arguments[0].cluster);
            }
            other => panic!("expected func node, got {:?}", other),
        }
    }

    #[test]
    fn test_cluster_argument() {
        let json = r#"{ "cluster": true, "value": [{ "type": "text", "value": "a" }] }"#;
        let arg: Argument = serde_json::from_str(json).unwrap();
        assert!(arg.cluster);
        assert_eq!(arg.nodes.len(), 1);
    }

    #[test]
    fn test_pseudo_styles_accept_tagged_rules() {
        let json = r#"{
            "type": "pseudo",
            "selector": ":hover",
            "styles": [{ "type": "rule", "property": "opacity", "value": [[{ "type": "text", "value": "0" }]] }]
        }"#;
        let token: Token = serde_json::from_str(json).unwrap();
        match token {
            Token::Pseudo(pseudo) => {
                assert_eq!(pseudo.selector, ":hover");
                assert_eq!(pseudo.styles[0].property, "opacity");
            }
            other => panic!("expected pseudo token, got {:?}", other),
        }
    }

    #[test]
    fn test_keyframes_token() {
        let json = r#"{
            "type": "keyframes",
            "name": "spin",
            "steps": [
                { "name": "from", "styles": [{ "property": "transform", "value": [[{ "type": "text", "value": "rotate(0)" }]] }] },
                { "name": "to", "styles": [] }
            ]
        }"#;
        let token: Token = serde_json::from_str(json).unwrap();
        match token {
            Token::Keyframes(kf) => {
                assert_eq!(kf.name, "spin");
                assert_eq!(kf.steps.len(), 2);
                assert_eq!(kf.steps[1].name, "to");
            }
            other => panic!("expected keyframes token, got {:?}", other),
        }
    }

    #[test]
    fn test_grid_size_count() {
        let grid = GridSize::new(3, 4, 1);
        assert_eq!(grid.count, 12);
        assert!(!grid.is_layered());
        assert!(GridSize::new(1, 1, 8).is_layered());
    }

    #[test]
    fn test_styles_to_css_skips_empty_buffers() {
        let styles = Styles {
            host: ":host { a: b; }".to_string(),
            cells: "#c { c: d; }".to_string(),
            ..Default::default()
        };
        assert_eq!(styles.to_css(), ":host { a: b; }\n#c { c: d; }");
    }

    #[test]
    fn test_strip_marker() {
        assert_eq!(strip_marker("@nth"), "nth");
        assert_eq!(strip_marker("nth"), "nth");
    }
}
