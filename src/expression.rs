//! Arithmetic expressions for the `calc` function
//!
//! Expressions are tokenized and then parsed by recursive descent. Names
//! resolve against the coordinates of the cell being composed.

use std::collections::HashMap;
use std::f64::consts;

use crate::cell::Call;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExpressionError {
    #[error("unknown variable: {0}")]
    UnknownVariable(String),
    #[error("unknown function: {0}")]
    UnknownFunction(String),
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("{name}() takes {expected} argument(s), got {got}")]
    Arity { name: String, expected: usize, got: usize },
}

/// Evaluates `calc` expressions.
///
/// Names: `x`, `y`, `z`, `i` for the cell, `X`, `Y`, `Z`, `I` for the grid,
/// `n`, `N` for values injected by repeating callers, plus `PI` and `E`.
/// Operators `+ - * / % ^` follow the usual precedence, `^` associating to
/// the right. Functions: `sin cos tan sqrt abs floor ceil round pow min max clamp`.
pub struct ExpressionEvaluator {
    variables: HashMap<String, f64>,
}

impl ExpressionEvaluator {
    pub fn new(variables: HashMap<String, f64>) -> Self {
        Self { variables }
    }

    /// Bind the cell and injected values of a function call.
    pub fn for_call(call: &Call<'_>) -> Self {
        let cell = call.cell;
        let grid = cell.grid;
        let mut variables: HashMap<String, f64> = [
            ("x", f64::from(cell.x)),
            ("y", f64::from(cell.y)),
            ("z", f64::from(cell.z)),
            ("i", f64::from(cell.count)),
            ("X", f64::from(grid.x)),
            ("Y", f64::from(grid.y)),
            ("Z", f64::from(grid.z)),
            ("I", f64::from(grid.count)),
            ("PI", consts::PI),
            ("E", consts::E),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();

        for (name, text) in ["n", "N"].into_iter().zip(call.extra) {
            if let Ok(value) = text.trim().parse::<f64>() {
                variables.insert(name.to_string(), value);
            }
        }
        Self { variables }
    }

    pub fn with_var(mut self, name: &str, value: f64) -> Self {
        self.variables.insert(name.to_string(), value);
        self
    }

    pub fn evaluate(&self, source: &str) -> Result<f64, ExpressionError> {
        let tokens = tokenize(source)?;
        if tokens.is_empty() {
            return Err(ExpressionError::Syntax("empty expression".to_string()));
        }

        let mut parser = Parser { tokens: &tokens, pos: 0, variables: &self.variables };
        let value = parser.sum()?;
        match parser.peek() {
            None => Ok(value),
            Some(extra) => Err(ExpressionError::Syntax(format!("unexpected {:?} in '{}'", extra, source.trim()))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Num(f64),
    Name(String),
    Op(char),
    Open,
    Close,
    Comma,
}

fn tokenize(source: &str) -> Result<Vec<Tok>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut end = start;
                let mut prev = ' ';
                while let Some(&(i, d)) = chars.peek() {
                    let exponent_sign = (d == '-' || d == '+') && (prev == 'e' || prev == 'E');
                    if d.is_ascii_digit() || d == '.' || d == 'e' || d == 'E' || exponent_sign {
                        end = i + d.len_utf8();
                        prev = d;
                        chars.next();
                    } else {
                        break;
                    }
                }
                let text = &source[start..end];
                let value = text
                    .parse::<f64>()
                    .map_err(|_| ExpressionError::Syntax(format!("bad number '{}'", text)))?;
                tokens.push(Tok::Num(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = start;
                while let Some(&(i, d)) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        end = i + 1;
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Tok::Name(source[start..end].to_string()));
            }
            '+' | '-' | '*' | '/' | '%' | '^' => {
                tokens.push(Tok::Op(c));
                chars.next();
            }
            '(' => {
                tokens.push(Tok::Open);
                chars.next();
            }
            ')' => {
                tokens.push(Tok::Close);
                chars.next();
            }
            ',' => {
                tokens.push(Tok::Comma);
                chars.next();
            }
            other => return Err(ExpressionError::Syntax(format!("unexpected character '{}'", other))),
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Tok],
    pos: usize,
    variables: &'a HashMap<String, f64>,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Tok> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn eat_op(&mut self, ops: &[char]) -> Option<char> {
        let op = match self.peek() {
            Some(Tok::Op(op)) if ops.contains(op) => *op,
            _ => return None,
        };
        self.pos += 1;
        Some(op)
    }

    fn expect(&mut self, wanted: Tok) -> Result<(), ExpressionError> {
        match self.next() {
            Some(tok) if tok == wanted => Ok(()),
            found => Err(ExpressionError::Syntax(format!("expected {:?}, found {:?}", wanted, found))),
        }
    }

    fn sum(&mut self) -> Result<f64, ExpressionError> {
        let mut acc = self.product()?;
        while let Some(op) = self.eat_op(&['+', '-']) {
            let rhs = self.product()?;
            acc = if op == '+' { acc + rhs } else { acc - rhs };
        }
        Ok(acc)
    }

    fn product(&mut self) -> Result<f64, ExpressionError> {
        let mut acc = self.unary()?;
        while let Some(op) = self.eat_op(&['*', '/', '%']) {
            let rhs = self.unary()?;
            acc = match op {
                '*' => acc * rhs,
                _ if rhs == 0.0 => return Err(ExpressionError::DivisionByZero),
                '/' => acc / rhs,
                _ => acc % rhs,
            };
        }
        Ok(acc)
    }

    fn unary(&mut self) -> Result<f64, ExpressionError> {
        match self.eat_op(&['-', '+']) {
            Some('-') => Ok(-self.unary()?),
            Some(_) => self.unary(),
            None => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64, ExpressionError> {
        let base = self.atom()?;
        if self.eat_op(&['^']).is_some() {
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<f64, ExpressionError> {
        match self.next() {
            Some(Tok::Num(value)) => Ok(value),
            Some(Tok::Open) => {
                let value = self.sum()?;
                self.expect(Tok::Close)?;
                Ok(value)
            }
            Some(Tok::Name(name)) if self.peek() == Some(&Tok::Open) => {
                self.pos += 1;
                let args = self.arguments()?;
                apply(&name, &args)
            }
            Some(Tok::Name(name)) => {
                self.variables.get(&name).copied().ok_or(ExpressionError::UnknownVariable(name))
            }
            Some(other) => Err(ExpressionError::Syntax(format!("unexpected {:?}", other))),
            None => Err(ExpressionError::Syntax("unexpected end of expression".to_string())),
        }
    }

    /// Comma separated values up to and including the closing parenthesis.
    fn arguments(&mut self) -> Result<Vec<f64>, ExpressionError> {
        let mut args = Vec::new();
        if self.peek() == Some(&Tok::Close) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.sum()?);
            match self.next() {
                Some(Tok::Comma) => continue,
                Some(Tok::Close) => return Ok(args),
                found => {
                    return Err(ExpressionError::Syntax(format!("expected ',' or ')', found {:?}", found)))
                }
            }
        }
    }
}

fn apply(name: &str, args: &[f64]) -> Result<f64, ExpressionError> {
    let lower = name.to_ascii_lowercase();
    let expected = match lower.as_str() {
        "sin" | "cos" | "tan" | "sqrt" | "abs" | "floor" | "ceil" | "round" => 1,
        "pow" | "min" | "max" => 2,
        "clamp" => 3,
        _ => return Err(ExpressionError::UnknownFunction(name.to_string())),
    };
    if args.len() != expected {
        return Err(ExpressionError::Arity { name: lower, expected, got: args.len() });
    }

    let value = match (lower.as_str(), args) {
        ("sin", [a]) => a.sin(),
        ("cos", [a]) => a.cos(),
        ("tan", [a]) => a.tan(),
        ("sqrt", [a]) => a.sqrt(),
        ("abs", [a]) => a.abs(),
        ("floor", [a]) => a.floor(),
        ("ceil", [a]) => a.ceil(),
        ("round", [a]) => a.round(),
        ("pow", [a, b]) => a.powf(*b),
        ("min", [a, b]) => a.min(*b),
        ("max", [a, b]) => a.max(*b),
        (_, [value, lo, hi]) => value.max(*lo).min(*hi),
        _ => return Err(ExpressionError::UnknownFunction(name.to_string())),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Cell, SharedContext};
    use crate::models::GridSize;

    fn eval(source: &str) -> Result<f64, ExpressionError> {
        ExpressionEvaluator::new(HashMap::new()).evaluate(source)
    }

    #[test]
    fn test_literals() {
        assert_eq!(eval("42").unwrap(), 42.0);
        assert_eq!(eval("0.25").unwrap(), 0.25);
        assert_eq!(eval(".5").unwrap(), 0.5);
        assert_eq!(eval("1e-3").unwrap(), 0.001);
        assert_eq!(eval("-5").unwrap(), -5.0);
    }

    #[test]
    fn test_names_bound_from_call() {
        let cell = Cell::new(2, 3, 1, 7, GridSize::new(4, 5, 1), SharedContext::new());
        let extra = vec!["4".to_string(), "9".to_string()];
        let call = Call::new(&cell, 0, &extra);
        let e = ExpressionEvaluator::for_call(&call);

        assert_eq!(e.evaluate("x").unwrap(), 2.0);
        assert_eq!(e.evaluate("y").unwrap(), 3.0);
        assert_eq!(e.evaluate("i").unwrap(), 7.0);
        assert_eq!(e.evaluate("X * Y").unwrap(), 20.0);
        assert_eq!(e.evaluate("I").unwrap(), 20.0);
        assert_eq!(e.evaluate("n + N").unwrap(), 13.0);
        assert!(matches!(e.evaluate("q"), Err(ExpressionError::UnknownVariable(name)) if name == "q"));
    }

    #[test]
    fn test_operators_and_precedence() {
        assert_eq!(eval("2+3*4").unwrap(), 14.0);
        assert_eq!(eval("(2+3)*4").unwrap(), 20.0);
        assert_eq!(eval("7 / 2").unwrap(), 3.5);
        assert_eq!(eval("10 % 3").unwrap(), 1.0);
        assert_eq!(eval("10 - 3 - 2").unwrap(), 5.0);
        assert_eq!(eval("16 / 4 / 2").unwrap(), 2.0);
        assert_eq!(eval("2 ^ 3 ^ 2").unwrap(), 512.0);
        assert_eq!(eval("-2 ^ 2").unwrap(), -4.0);
        assert_eq!(eval("3 * -2").unwrap(), -6.0);
        assert_eq!(eval("((1+1))*(2+2)").unwrap(), 8.0);
    }

    #[test]
    fn test_zero_divisor() {
        assert_eq!(eval("10/0"), Err(ExpressionError::DivisionByZero));
        assert_eq!(eval("1 % (2 - 2)"), Err(ExpressionError::DivisionByZero));
    }

    #[test]
    fn test_builtin_functions() {
        assert_eq!(eval("abs(-5)").unwrap(), 5.0);
        assert_eq!(eval("min(3, 7) + max(3, 7)").unwrap(), 10.0);
        assert_eq!(eval("floor(3.7)").unwrap(), 3.0);
        assert_eq!(eval("pow(2, 3)").unwrap(), 8.0);
        assert_eq!(eval("clamp(15, 0, 10)").unwrap(), 10.0);
        assert_eq!(eval("max(1, min(4, 2 * 3))").unwrap(), 4.0);
        assert!((eval("COS(0)").unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_bad_calls() {
        assert_eq!(eval("nope(5)"), Err(ExpressionError::UnknownFunction("nope".to_string())));
        assert_eq!(
            eval("abs(1, 2)"),
            Err(ExpressionError::Arity { name: "abs".to_string(), expected: 1, got: 2 })
        );
    }

    #[test]
    fn test_malformed_input() {
        for source in ["  ", "(1 + 2", "1 2", "3 +", "4 $ 2", "min(1,"] {
            assert!(matches!(eval(source), Err(ExpressionError::Syntax(_))), "{source:?} should not parse");
        }
    }

    #[test]
    fn test_extra_variable() {
        let e = ExpressionEvaluator::new(HashMap::new()).with_var("scale", 2.0);
        assert_eq!(e.evaluate("scale * 10").unwrap(), 20.0);
    }
}
