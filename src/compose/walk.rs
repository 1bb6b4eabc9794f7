//! Token tree walking for one cell.

use tracing::{debug, trace, warn};

use crate::cell::{Call, Cell};
use crate::functions::FunctionError;
use crate::models::{strip_marker, CondToken, KeyframesToken, PseudoToken, Token};
use crate::properties::{TransformOptions, Transformed};
use crate::selector::{compose_selector, is_host_selector, is_special_selector, normalize_host_alias};

use super::{Composer, Property};

impl<'a> Composer<'a> {
    /// Walk the token tree for `cell` and record it in the history.
    ///
    /// With `initial` set this is the discovery pass: once any grid size is
    /// known the remaining tokens are only searched for a host grid, which
    /// overrides a cell-level one.
    pub fn compose(&mut self, cell: &Cell, tokens: &'a [Token], initial: bool) -> Result<(), FunctionError> {
        trace!(x = cell.x, y = cell.y, z = cell.z, count = cell.count, "composing cell");
        self.history.push(cell.clone());
        self.discovering = initial;
        self.walk(cell, tokens, initial)
    }

    pub(super) fn walk(&mut self, cell: &Cell, tokens: &'a [Token], initial: bool) -> Result<(), FunctionError> {
        for (i, token) in tokens.iter().enumerate() {
            if initial && self.grid.is_some() {
                if !self.is_host_grid {
                    self.seek_host_grid(cell, &tokens[i..])?;
                }
                break;
            }
            match token {
                Token::Rule(rule) => {
                    let selector = compose_selector(cell, None);
                    let text = self.compose_rule(rule, cell, Some(selector.as_str()))?;
                    self.rules.push(&selector, text);
                }
                Token::Pseudo(pseudo) => self.compose_pseudo(pseudo, cell)?,
                Token::Cond(cond) => self.compose_cond(cond, cell, initial)?,
                Token::Keyframes(keyframes) => {
                    if self.keyframes.register(keyframes) {
                        debug!(name = %keyframes.name, "keyframes registered");
                    }
                }
            }
        }
        Ok(())
    }

    fn compose_pseudo(&mut self, token: &'a PseudoToken, cell: &Cell) -> Result<(), FunctionError> {
        let key: *const PseudoToken = token;
        if self.processed.contains(&key) {
            return Ok(());
        }

        let selector = normalize_host_alias(&token.selector);
        let special = is_special_selector(&selector);
        if special {
            self.processed.insert(key);
        }

        for part in selector.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let target = if special {
                normalize_host_alias(part).into_owned()
            } else {
                compose_selector(cell, Some(part))
            };
            for rule in &token.styles {
                let text = self.compose_rule(rule, cell, Some(target.as_str()))?;
                self.rules.push(&target, text);
            }
        }
        Ok(())
    }

    fn compose_cond(&mut self, token: &'a CondToken, cell: &Cell, initial: bool) -> Result<(), FunctionError> {
        if self.holds(token, cell)? {
            self.walk(cell, &token.styles, initial)?;
        }
        Ok(())
    }

    /// Evaluate the selector predicate of a conditional block.
    fn holds(&self, token: &CondToken, cell: &Cell) -> Result<bool, FunctionError> {
        let name = strip_marker(&token.name);
        let Some(predicate) = self.selectors.get(name) else {
            warn!("unknown selector function '{}'", name);
            return Ok(false);
        };

        let mut args = Vec::with_capacity(token.arguments.len());
        for argument in &token.arguments {
            args.extend(self.compose_argument(argument, cell, &[])?);
        }
        predicate(&Call::new(cell, 0, &[]), &args)
    }

    /// Look for a host `@grid` without composing or storing anything else.
    ///
    /// Blocks passed over here are composed later against real cells.
    fn seek_host_grid(&mut self, cell: &Cell, tokens: &[Token]) -> Result<(), FunctionError> {
        for token in tokens {
            if self.is_host_grid {
                break;
            }
            match token {
                Token::Pseudo(pseudo) => {
                    let selector = normalize_host_alias(&pseudo.selector);
                    if !selector.split(',').any(|part| is_host_selector(part.trim())) {
                        continue;
                    }
                    for rule in pseudo.styles.iter().filter(|r| Property::classify(&r.property) == Property::Grid) {
                        let mut groups = Vec::with_capacity(rule.value.len());
                        for group in &rule.value {
                            let composed = self.compose_value(group, cell, &[])?;
                            if !composed.is_empty() {
                                groups.push(composed);
                            }
                        }
                        let value = groups.join(", ");
                        let options = TransformOptions { is_special_selector: true };
                        if let Some(Transformed::Grid { grid, .. }) = self.properties.transform(&rule.property, &value, options) {
                            debug!(x = grid.x, y = grid.y, z = grid.z, "grid set on host");
                            self.grid = Some(grid);
                            self.is_host_grid = true;
                        }
                    }
                }
                Token::Cond(cond) => {
                    if self.holds(cond, cell)? {
                        self.seek_host_grid(cell, &cond.styles)?;
                    }
                }
                Token::Rule(_) | Token::Keyframes(_) => {}
            }
        }
        Ok(())
    }

    /// Render the body of a keyframes definition for one cell.
    pub fn render_keyframes(&mut self, token: &'a KeyframesToken, cell: &Cell) -> Result<String, FunctionError> {
        let mut steps = Vec::with_capacity(token.steps.len());
        for step in &token.steps {
            let mut rules = Vec::with_capacity(step.styles.len());
            for rule in &step.styles {
                let text = self.compose_rule(rule, cell, None)?;
                if !text.is_empty() {
                    rules.push(text);
                }
            }
            steps.push(format!("  {} {{ {} }}", step.name, rules.join(" ")));
        }
        Ok(steps.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use crate::cell::{Cell, SharedContext};
    use crate::compose::Composer;
    use crate::functions::{FunctionRegistry, SelectorRegistry};
    use crate::models::{Argument, CondToken, GridSize, KeyframeStep, KeyframesToken, PseudoToken, RuleToken, Token};
    use crate::prefixer::VendorPrefixer;
    use crate::properties::DefaultProperties;

    fn cell(x: u32, y: u32, count: u32) -> Cell {
        Cell::new(x, y, 1, count, GridSize::new(2, 2, 1), SharedContext::new())
    }

    fn pseudo(selector: &str, rules: Vec<RuleToken>) -> Token {
        Token::Pseudo(PseudoToken { selector: selector.to_string(), styles: rules })
    }

    #[test]
    fn test_rules_go_to_the_cell() {
        let functions = FunctionRegistry::with_builtins();
        let selectors = SelectorRegistry::with_builtins();
        let tokens = vec![Token::Rule(RuleToken::text("color", "red"))];
        let mut composer = Composer::new(&functions, &selectors, &DefaultProperties, &VendorPrefixer);

        composer.compose(&cell(1, 2, 2), &tokens, false).unwrap();
        assert_eq!(composer.rules().get("#cell-1-2-1").unwrap(), &["color: red;".to_string()]);
        assert_eq!(composer.history().len(), 1);
    }

    #[test]
    fn test_special_pseudo_composed_once() {
        let functions = FunctionRegistry::with_builtins();
        let selectors = SelectorRegistry::with_builtins();
        let tokens = vec![pseudo(":doodle", vec![RuleToken::text("background", "#000")])];
        let mut composer = Composer::new(&functions, &selectors, &DefaultProperties, &VendorPrefixer);

        composer.compose(&cell(1, 1, 1), &tokens, false).unwrap();
        composer.compose(&cell(1, 2, 2), &tokens, false).unwrap();
        assert_eq!(composer.rules().get(":host").unwrap(), &["background: #000;".to_string()]);
        assert_eq!(composer.rules().len(), 1);
    }

    #[test]
    fn test_cell_pseudo_per_cell_and_per_part() {
        let functions = FunctionRegistry::with_builtins();
        let selectors = SelectorRegistry::with_builtins();
        let tokens = vec![pseudo("::after, :hover", vec![RuleToken::text("opacity", "0")])];
        let mut composer = Composer::new(&functions, &selectors, &DefaultProperties, &VendorPrefixer);

        composer.compose(&cell(1, 1, 1), &tokens, false).unwrap();
        composer.compose(&cell(1, 2, 2), &tokens, false).unwrap();
        let selectors: Vec<&str> = composer.rules().iter().map(|(s, _)| s).collect();
        assert_eq!(
            selectors,
            vec!["#cell-1-1-1::after", "#cell-1-1-1:hover", "#cell-1-2-1::after", "#cell-1-2-1:hover"]
        );
    }

    #[test]
    fn test_cond_applies_when_predicate_holds() {
        let functions = FunctionRegistry::with_builtins();
        let selectors = SelectorRegistry::with_builtins();
        let tokens = vec![Token::Cond(CondToken {
            name: "@nth".to_string(),
            arguments: vec![Argument::text("2")],
            styles: vec![Token::Rule(RuleToken::text("color", "blue"))],
        })];
        let mut composer = Composer::new(&functions, &selectors, &DefaultProperties, &VendorPrefixer);

        composer.compose(&cell(1, 1, 1), &tokens, false).unwrap();
        composer.compose(&cell(1, 2, 2), &tokens, false).unwrap();
        assert!(composer.rules().get("#cell-1-1-1").is_none());
        assert_eq!(composer.rules().get("#cell-1-2-1").unwrap(), &["color: blue;".to_string()]);
        // nested walks do not add history entries
        assert_eq!(composer.history().len(), 2);
    }

    #[test]
    fn test_unknown_predicate_skips_block() {
        let functions = FunctionRegistry::with_builtins();
        let selectors = SelectorRegistry::with_builtins();
        let tokens = vec![Token::Cond(CondToken {
            name: "@nope".to_string(),
            arguments: Vec::new(),
            styles: vec![Token::Rule(RuleToken::text("color", "blue"))],
        })];
        let mut composer = Composer::new(&functions, &selectors, &DefaultProperties, &VendorPrefixer);
        composer.compose(&cell(1, 1, 1), &tokens, false).unwrap();
        assert!(composer.rules().is_empty());
    }

    #[test]
    fn test_discovery_stops_after_host_grid() {
        let functions = FunctionRegistry::with_builtins();
        let selectors = SelectorRegistry::with_builtins();
        let tokens = vec![
            pseudo(":host", vec![RuleToken::text("@grid", "3")]),
            Token::Rule(RuleToken::text("color", "red")),
        ];
        let mut composer = Composer::new(&functions, &selectors, &DefaultProperties, &VendorPrefixer);
        composer.compose(&Cell::discovery(), &tokens, true).unwrap();
        assert_eq!(composer.grid(), Some(GridSize::new(3, 3, 1)));
        assert!(composer.rules().get("#cell-1-1-1").is_none());
    }

    #[test]
    fn test_discovery_leaves_blocks_after_cell_grid_alone() {
        let functions = FunctionRegistry::with_builtins();
        let selectors = SelectorRegistry::with_builtins();
        let tokens = vec![
            Token::Rule(RuleToken::text("@grid", "3")),
            pseudo(":host", vec![RuleToken::text("background", "#000")]),
            pseudo(":container", vec![RuleToken::text("gap", "1px")]),
        ];
        let mut composer = Composer::new(&functions, &selectors, &DefaultProperties, &VendorPrefixer);
        composer.compose(&Cell::discovery(), &tokens, true).unwrap();

        assert_eq!(composer.grid(), Some(GridSize::new(3, 3, 1)));
        assert!(composer.rules().get(":container").is_none());
        assert!(composer.rules().get(":host").is_none());

        // the skipped blocks are still composed once cells are expanded
        composer.reset_cells();
        composer.compose(&cell(1, 1, 1), &tokens, false).unwrap();
        assert_eq!(composer.rules().get(":container").unwrap(), &["gap: 1px;".to_string()]);
        assert_eq!(composer.rules().get(":host").unwrap(), &["background: #000;".to_string()]);
    }

    #[test]
    fn test_host_grid_found_after_cell_grid() {
        let functions = FunctionRegistry::with_builtins();
        let selectors = SelectorRegistry::with_builtins();
        let tokens = vec![
            Token::Rule(RuleToken::text("@grid", "5")),
            pseudo(":host", vec![RuleToken::text("color", "red"), RuleToken::text("@grid", "2x1")]),
        ];
        let mut composer = Composer::new(&functions, &selectors, &DefaultProperties, &VendorPrefixer);
        composer.compose(&Cell::discovery(), &tokens, true).unwrap();

        assert_eq!(composer.grid(), Some(GridSize::new(2, 1, 1)));
        assert!(composer.rules().get(":host").is_none());
    }

    #[test]
    fn test_use_walks_nested_tokens() {
        let functions = FunctionRegistry::with_builtins();
        let selectors = SelectorRegistry::with_builtins();
        let mut include = RuleToken::text("@use", "var(--rule)");
        include.styles = vec![Token::Rule(RuleToken::text("color", "green"))];
        let tokens = vec![Token::Rule(include)];
        let mut composer = Composer::new(&functions, &selectors, &DefaultProperties, &VendorPrefixer);
        composer.compose(&cell(1, 1, 1), &tokens, false).unwrap();
        assert_eq!(composer.rules().get("#cell-1-1-1").unwrap(), &["color: green;".to_string()]);
    }

    #[test]
    fn test_keyframes_first_wins_and_renders() {
        let functions = FunctionRegistry::with_builtins();
        let selectors = SelectorRegistry::with_builtins();
        let first = KeyframesToken {
            name: "fade".to_string(),
            steps: vec![
                KeyframeStep { name: "from".to_string(), styles: vec![RuleToken::text("opacity", "0")] },
                KeyframeStep { name: "to".to_string(), styles: vec![RuleToken::text("opacity", "1")] },
            ],
        };
        let second = KeyframesToken { name: "fade".to_string(), steps: Vec::new() };
        let tokens = vec![Token::Keyframes(first), Token::Keyframes(second)];
        let mut composer = Composer::new(&functions, &selectors, &DefaultProperties, &VendorPrefixer);
        composer.compose(&cell(1, 1, 1), &tokens, false).unwrap();

        let registered: Vec<_> = composer.keyframes().iter().collect();
        assert_eq!(registered.len(), 1);
        let body = composer.render_keyframes(registered[0], &cell(1, 1, 1)).unwrap();
        assert_eq!(body, "  from { opacity: 0; }\n  to { opacity: 1; }");
    }

    #[test]
    fn test_reset_keeps_special_rules() {
        let functions = FunctionRegistry::with_builtins();
        let selectors = SelectorRegistry::with_builtins();
        let tokens = vec![
            pseudo(":host", vec![RuleToken::text("background", "#000")]),
            Token::Rule(RuleToken::text("color", "red")),
        ];
        let mut composer = Composer::new(&functions, &selectors, &DefaultProperties, &VendorPrefixer);
        composer.compose(&Cell::discovery(), &tokens, true).unwrap();
        composer.reset_cells();
        assert!(composer.history().is_empty());
        let selectors: Vec<&str> = composer.rules().iter().map(|(s, _)| s).collect();
        assert_eq!(selectors, vec![":host"]);
    }
}
