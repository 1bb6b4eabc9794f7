//! Grid driver
//!
//! [`Generator::generate`] runs a discovery pass over a single cell to learn
//! the grid size, resets per-cell state, expands every cell of the grid and
//! finally groups the collected rules into the four output buffers.

use tracing::debug;

use crate::cell::{Cell, SharedContext, DEFAULT_SEED};
use crate::compose::Composer;
use crate::functions::{FunctionError, FunctionRegistry, SelectorRegistry};
use crate::models::{GridSize, Output, Styles, Token};
use crate::prefixer::{Prefixer, VendorPrefixer};
use crate::properties::{DefaultProperties, PropertyTable};
use crate::selector::{is_host_selector, is_parent_selector, CONTAINER_CLASS};

/// Compiles token trees into grid CSS.
///
/// A generator is reusable: every call to [`generate`](Generator::generate)
/// starts from fresh state and an identically seeded context, so the same
/// input always yields the same output.
pub struct Generator {
    functions: FunctionRegistry,
    selectors: SelectorRegistry,
    properties: Box<dyn PropertyTable>,
    prefixer: Box<dyn Prefixer>,
    seed: u64,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator {
    /// Generator with the builtin functions, predicates, directives and prefixes.
    pub fn new() -> Self {
        Self {
            functions: FunctionRegistry::with_builtins(),
            selectors: SelectorRegistry::with_builtins(),
            properties: Box::new(DefaultProperties),
            prefixer: Box::new(VendorPrefixer),
            seed: DEFAULT_SEED,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_functions(mut self, functions: FunctionRegistry) -> Self {
        self.functions = functions;
        self
    }

    pub fn with_selectors(mut self, selectors: SelectorRegistry) -> Self {
        self.selectors = selectors;
        self
    }

    pub fn with_properties(mut self, properties: impl PropertyTable + 'static) -> Self {
        self.properties = Box::new(properties);
        self
    }

    pub fn with_prefixer(mut self, prefixer: impl Prefixer + 'static) -> Self {
        self.prefixer = Box::new(prefixer);
        self
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn functions_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.functions
    }

    pub fn selectors(&self) -> &SelectorRegistry {
        &self.selectors
    }

    pub fn selectors_mut(&mut self) -> &mut SelectorRegistry {
        &mut self.selectors
    }

    /// Compile `tokens`. A grid directive in the tree overrides `default_grid`.
    pub fn generate(&self, tokens: &[Token], default_grid: GridSize) -> Result<Output, FunctionError> {
        let mut composer =
            Composer::new(&self.functions, &self.selectors, self.properties.as_ref(), self.prefixer.as_ref());

        let discovery = Cell::new(1, 1, 1, 1, GridSize::default(), SharedContext::with_seed(self.seed));
        composer.compose(&discovery, tokens, true)?;
        let grid = composer.grid().unwrap_or(default_grid);
        debug!(x = grid.x, y = grid.y, z = grid.z, discovered = composer.grid().is_some(), "grid resolved");

        composer.reset_cells();

        let context = SharedContext::with_seed(self.seed);
        for (index, (x, y, z)) in coordinates(grid).into_iter().enumerate() {
            let cell = Cell::new(x, y, z, index as u32 + 1, grid, context.clone());
            composer.compose(&cell, tokens, false)?;
        }
        debug!(cells = composer.history().len(), "expansion done");

        let styles = render_styles(&mut composer)?;
        Ok(Output { props: composer.props(), styles, grid })
    }
}

/// Visiting order: row-major `x` then `y`, or `z` alone for layered grids.
pub fn coordinates(grid: GridSize) -> Vec<(u32, u32, u32)> {
    if grid.is_layered() {
        return (1..=grid.z).map(|z| (1, 1, z)).collect();
    }
    (1..=grid.x).flat_map(|x| (1..=grid.y).map(move |y| (x, y, 1))).collect()
}

fn render_styles(composer: &mut Composer<'_>) -> Result<Styles, FunctionError> {
    let mut styles = Styles::default();

    for (selector, rules) in composer.rules().iter() {
        let declarations: Vec<&str> = rules.iter().map(|r| r.as_str()).filter(|r| !r.is_empty()).collect();
        if declarations.is_empty() {
            continue;
        }
        if let Some(tail) = parent_tail(selector) {
            styles.container.push_str(&block(&format!("{}{}", CONTAINER_CLASS, tail), &declarations));
        } else if is_host_selector(selector) {
            styles.host.push_str(&block(selector, &declarations));
        } else {
            styles.cells.push_str(&block(selector, &declarations));
        }
    }

    let history = composer.history().to_vec();
    let keyframes: Vec<_> = composer.keyframes().iter().collect();
    for (i, cell) in history.iter().enumerate() {
        for token in keyframes.iter().copied() {
            let body = composer.render_keyframes(token, cell)?;
            // the bare name serves as a fallback definition
            if i == 0 {
                styles.keyframes.push_str(&keyframes_block(&token.name, &body));
            }
            styles.keyframes.push_str(&keyframes_block(&format!("{}-{}", token.name, cell.count), &body));
        }
    }

    Ok(styles)
}

fn parent_tail(selector: &str) -> Option<&str> {
    if !is_parent_selector(selector) {
        return None;
    }
    [":container", ":parent"].iter().find_map(|p| selector.strip_prefix(*p))
}

fn block(selector: &str, declarations: &[&str]) -> String {
    let mut text = format!("{} {{\n", selector);
    for declaration in declarations {
        text.push_str("  ");
        text.push_str(declaration);
        text.push('\n');
    }
    text.push_str("}\n");
    text
}

fn keyframes_block(name: &str, body: &str) -> String {
    format!("@keyframes {} {{\n{}\n}}\n", name, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{KeyframeStep, KeyframesToken, PseudoToken, RuleToken, ValueNode};

    fn rule(property: &str, value: &str) -> Token {
        Token::Rule(RuleToken::text(property, value))
    }

    fn pseudo(selector: &str, rules: Vec<RuleToken>) -> Token {
        Token::Pseudo(PseudoToken { selector: selector.to_string(), styles: rules })
    }

    fn spin() -> Token {
        Token::Keyframes(KeyframesToken {
            name: "spin".to_string(),
            steps: vec![KeyframeStep { name: "to".to_string(), styles: vec![RuleToken::text("transform", "rotate(1turn)")] }],
        })
    }

    #[test]
    fn test_coordinates_row_major() {
        assert_eq!(coordinates(GridSize::new(2, 3, 1)), vec![(1, 1, 1), (1, 2, 1), (1, 3, 1), (2, 1, 1), (2, 2, 1), (2, 3, 1)]);
    }

    #[test]
    fn test_coordinates_layered() {
        assert_eq!(coordinates(GridSize::new(1, 1, 3)), vec![(1, 1, 1), (1, 1, 2), (1, 1, 3)]);
    }

    #[test]
    fn test_count_is_sequential() {
        let tokens = vec![Token::Rule(RuleToken {
            property: "--i".to_string(),
            value: vec![vec![ValueNode::func("@i", vec![])]],
            styles: Vec::new(),
        })];
        let output = Generator::new().generate(&tokens, GridSize::new(3, 2, 1)).unwrap();
        for i in 1..=6 {
            assert!(output.styles.cells.contains(&format!("--i: {};", i)), "missing count {}", i);
        }
        assert!(!output.styles.cells.contains("--i: 7;"));
    }

    #[test]
    fn test_two_cells_plain_rule() {
        let output = Generator::new().generate(&[rule("color", "red")], GridSize::new(2, 1, 1)).unwrap();
        assert_eq!(output.styles.cells, "#cell-1-1-1 {\n  color: red;\n}\n#cell-2-1-1 {\n  color: red;\n}\n");
        assert!(output.styles.host.is_empty());
        assert!(output.styles.container.is_empty());
        assert!(output.styles.keyframes.is_empty());
        assert_eq!(output.grid, GridSize::new(2, 1, 1));
    }

    #[test]
    fn test_host_block_emitted_once() {
        let tokens = vec![pseudo(":host", vec![RuleToken::text("background", "#fff")])];
        let output = Generator::new().generate(&tokens, GridSize::new(4, 4, 1)).unwrap();
        assert_eq!(output.styles.host, ":host {\n  background: #fff;\n}\n");
        assert!(output.styles.cells.is_empty());
    }

    #[test]
    fn test_container_block() {
        let tokens = vec![pseudo(":container", vec![RuleToken::text("gap", "1px")])];
        let output = Generator::new().generate(&tokens, GridSize::new(2, 2, 1)).unwrap();
        assert_eq!(output.styles.container, ".container {\n  gap: 1px;\n}\n");
    }

    #[test]
    fn test_cell_grid_overrides_default_and_mirrors_once() {
        let tokens = vec![rule("@grid", "3x2 / 10em"), rule("color", "red")];
        let output = Generator::new().generate(&tokens, GridSize::new(5, 5, 1)).unwrap();
        assert_eq!(output.grid, GridSize::new(3, 2, 1));
        assert_eq!(output.styles.host, ":host {\n  width: 10em; height: 10em;\n}\n");
        assert_eq!(output.styles.cells.matches("color: red;").count(), 6);
    }

    #[test]
    fn test_host_grid_wins_regardless_of_order() {
        let tokens = vec![rule("@grid", "5"), pseudo(":host", vec![RuleToken::text("@grid", "2x1")])];
        let output = Generator::new().generate(&tokens, GridSize::default()).unwrap();
        assert_eq!(output.grid, GridSize::new(2, 1, 1));
    }

    #[test]
    fn test_host_block_after_cell_grid_sees_real_grid() {
        let size = RuleToken {
            property: "--n".to_string(),
            value: vec![vec![ValueNode::func("@size", Vec::new())]],
            styles: Vec::new(),
        };
        let tokens = vec![rule("@grid", "3"), pseudo(":host", vec![size])];
        let output = Generator::new().generate(&tokens, GridSize::default()).unwrap();
        assert_eq!(output.grid, GridSize::new(3, 3, 1));
        assert!(output.styles.host.contains("--n: 9;"), "got {}", output.styles.host);
        assert!(!output.styles.host.contains("--n: 1;"));
    }

    #[test]
    fn test_layered_grid() {
        let tokens = vec![rule("@grid", "1x1x4"), rule("opacity", "1")];
        let output = Generator::new().generate(&tokens, GridSize::default()).unwrap();
        assert_eq!(output.grid.count, 4);
        assert!(output.styles.cells.contains("#cell-1-1-4 {"));
    }

    #[test]
    fn test_keyframes_per_cell() {
        let tokens = vec![spin(), rule("animation-name", "spin")];
        let output = Generator::new().generate(&tokens, GridSize::new(3, 1, 1)).unwrap();
        assert_eq!(output.styles.keyframes.matches("@keyframes spin {").count(), 1);
        for i in 1..=3 {
            assert_eq!(output.styles.keyframes.matches(&format!("@keyframes spin-{} {{", i)).count(), 1);
            assert!(output.styles.cells.contains(&format!("animation-name: spin-{};", i)));
        }
        assert!(output.props.has_animation);
    }

    #[test]
    fn test_keyframes_single_cell() {
        let tokens = vec![spin(), rule("animation", "spin 1s")];
        let output = Generator::new().generate(&tokens, GridSize::default()).unwrap();
        assert!(output.styles.cells.contains("animation: spin 1s;"));
        assert_eq!(output.styles.keyframes.matches("@keyframes spin {").count(), 1);
        assert_eq!(output.styles.keyframes.matches("@keyframes spin-1 {").count(), 1);
    }

    #[test]
    fn test_deterministic() {
        let tokens = vec![Token::Rule(RuleToken {
            property: "opacity".to_string(),
            value: vec![vec![ValueNode::func("@r", vec![crate::models::Argument::text("1")])]],
            styles: Vec::new(),
        })];
        let generator = Generator::new();
        let a = generator.generate(&tokens, GridSize::new(4, 4, 1)).unwrap();
        let b = generator.generate(&tokens, GridSize::new(4, 4, 1)).unwrap();
        assert_eq!(a, b);
        let c = Generator::new().with_seed(99).generate(&tokens, GridSize::new(4, 4, 1)).unwrap();
        assert_ne!(a.styles.cells, c.styles.cells);
    }

    #[test]
    fn test_function_error_aborts() {
        let tokens = vec![Token::Rule(RuleToken {
            property: "width".to_string(),
            value: vec![vec![ValueNode::func("@calc", vec![crate::models::Argument::text("1 / 0")])]],
            styles: Vec::new(),
        })];
        let err = Generator::new().generate(&tokens, GridSize::default()).unwrap_err();
        assert_eq!(err.name, "calc");
    }

    #[test]
    fn test_custom_function() {
        let mut generator = Generator::new();
        generator
            .functions_mut()
            .register_eager("hello", |_call, _args: &[String]| Ok(Some("world".to_string())));
        let tokens = vec![Token::Rule(RuleToken {
            property: "--greeting".to_string(),
            value: vec![vec![ValueNode::func("@hello", vec![])]],
            styles: Vec::new(),
        })];
        let output = generator.generate(&tokens, GridSize::default()).unwrap();
        assert!(output.styles.cells.contains("--greeting: world;"));
    }
}
