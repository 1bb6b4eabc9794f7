//! Math functions, resolved after custom functions.
//!
//! Arguments must all be numbers; anything else makes the call absent.

use crate::cell::Call;

use super::{format_number, FnResult, FunctionRegistry};

type Unary = fn(f64) -> f64;

const UNARY: &[(&str, Unary)] = &[
    ("abs", f64::abs),
    ("acos", f64::acos),
    ("asin", f64::asin),
    ("atan", f64::atan),
    ("cbrt", f64::cbrt),
    ("ceil", f64::ceil),
    ("cos", f64::cos),
    ("exp", f64::exp),
    ("floor", f64::floor),
    ("log", f64::ln),
    // JS-style rounding: halves go up
    ("round", round_half_up),
    ("sign", sign),
    ("sin", f64::sin),
    ("sqrt", f64::sqrt),
    ("tan", f64::tan),
    ("trunc", f64::trunc),
];

pub(super) fn register(registry: &mut FunctionRegistry) {
    for &(name, f) in UNARY {
        registry.register_math(name, move |_: &Call<'_>, args: &[String]| {
            let Some(&[v]) = numbers(args).as_deref() else {
                return Ok(None);
            };
            Ok(format_number(f(v)))
        });
    }

    registry.register_math("pow", |_: &Call<'_>, args: &[String]| binary(args, f64::powf));
    registry.register_math("atan2", |_: &Call<'_>, args: &[String]| binary(args, f64::atan2));
    registry.register_math("min", |_: &Call<'_>, args: &[String]| {
        fold(args, f64::min)
    });
    registry.register_math("max", |_: &Call<'_>, args: &[String]| {
        fold(args, f64::max)
    });
    registry.register_math("hypot", |_: &Call<'_>, args: &[String]| {
        let Some(values) = numbers(args) else {
            return Ok(None);
        };
        Ok(format_number(values.iter().map(|v| v * v).sum::<f64>().sqrt()))
    });
    registry.register_math("PI", |_: &Call<'_>, _: &[String]| Ok(format_number(std::f64::consts::PI)));
    registry.register_math("E", |_: &Call<'_>, _: &[String]| Ok(format_number(std::f64::consts::E)));
}

fn numbers(args: &[String]) -> Option<Vec<f64>> {
    args.iter().map(|a| a.trim().parse::<f64>().ok()).collect()
}

fn binary(args: &[String], f: fn(f64, f64) -> f64) -> FnResult {
    match numbers(args).as_deref() {
        Some(&[a, b]) => Ok(format_number(f(a, b))),
        _ => Ok(None),
    }
}

fn fold(args: &[String], f: fn(f64, f64) -> f64) -> FnResult {
    match numbers(args) {
        Some(values) if !values.is_empty() => {
            Ok(format_number(values.into_iter().reduce(f).unwrap_or_default()))
        }
        _ => Ok(None),
    }
}

fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;
    use crate::functions::Callable;

    fn run(name: &str, args: &[&str]) -> Option<String> {
        let registry = FunctionRegistry::with_builtins();
        let cell = Cell::discovery();
        let call = Call::new(&cell, 0, &[]);
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        match registry.get(name) {
            Some(Callable::Eager(f)) => f(&call, &args).unwrap(),
            other => panic!("expected eager '{}', got {:?}", name, other),
        }
    }

    #[test]
    fn test_unary() {
        assert_eq!(run("abs", &["-3"]), Some("3".to_string()));
        assert_eq!(run("floor", &["2.7"]), Some("2".to_string()));
        assert_eq!(run("sqrt", &["16"]), Some("4".to_string()));
        assert_eq!(run("sin", &["0"]), Some("0".to_string()));
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(run("round", &["2.5"]), Some("3".to_string()));
        assert_eq!(run("round", &["-2.5"]), Some("-2".to_string()));
    }

    #[test]
    fn test_min_max_variadic() {
        assert_eq!(run("min", &["4", "2", "8"]), Some("2".to_string()));
        assert_eq!(run("max", &["4", "2", "8"]), Some("8".to_string()));
        assert_eq!(run("max", &[]), None);
    }

    #[test]
    fn test_binary() {
        assert_eq!(run("pow", &["2", "10"]), Some("1024".to_string()));
        assert_eq!(run("pow", &["2"]), None);
        assert_eq!(run("hypot", &["3", "4"]), Some("5".to_string()));
    }

    #[test]
    fn test_non_numeric_is_absent() {
        assert_eq!(run("abs", &["red"]), None);
        assert_eq!(run("sqrt", &["-1"]), None);
    }

    #[test]
    fn test_constants() {
        assert_eq!(run("PI", &[]), Some(std::f64::consts::PI.to_string()));
    }
}
