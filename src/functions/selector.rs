//! Selector predicates for conditional blocks.

use crate::cell::Call;

use super::{FunctionError, SelectorRegistry};

pub(super) fn register(registry: &mut SelectorRegistry) {
    registry.register("nth", |call: &Call<'_>, args: &[String]| {
        Ok(any_nth(args, call.cell.count))
    });
    registry.register("even", |call: &Call<'_>, _: &[String]| Ok(call.cell.count % 2 == 0));
    registry.register("odd", |call: &Call<'_>, _: &[String]| Ok(call.cell.count % 2 == 1));
    registry.register("row", |call: &Call<'_>, args: &[String]| Ok(any_nth(args, call.cell.x)));
    registry.register("col", |call: &Call<'_>, args: &[String]| Ok(any_nth(args, call.cell.y)));
    registry.register("at", |call: &Call<'_>, args: &[String]| {
        let pos: Vec<u32> = args.iter().filter_map(|a| a.trim().parse().ok()).collect();
        Ok(match pos.as_slice() {
            [x, y, ..] => call.cell.x == *x && call.cell.y == *y,
            _ => false,
        })
    });
    registry.register("random", |call: &Call<'_>, args: &[String]| {
        let ratio = match args.first() {
            None => 0.5,
            Some(a) => a
                .trim()
                .parse::<f64>()
                .map_err(|_| FunctionError::new("random", format!("invalid ratio '{}'", a)))?,
        };
        Ok(call.context().random() < ratio)
    });
}

fn any_nth(args: &[String], index: u32) -> bool {
    args.iter().filter_map(|a| parse_nth(a)).any(|(a, b)| matches_nth(a, b, index as i64))
}

/// Parse a CSS `an+b` expression (`2n+1`, `-n+3`, `odd`, `even`, `4`).
pub fn parse_nth(expr: &str) -> Option<(i64, i64)> {
    let expr: String = expr.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_lowercase();
    match expr.as_str() {
        "odd" => return Some((2, 1)),
        "even" => return Some((2, 0)),
        _ => {}
    }

    let Some(n_pos) = expr.find('n') else {
        return expr.parse::<i64>().ok().map(|b| (0, b));
    };

    let a = match &expr[..n_pos] {
        "" | "+" => 1,
        "-" => -1,
        coefficient => coefficient.parse::<i64>().ok()?,
    };
    let b = match &expr[n_pos + 1..] {
        "" => 0,
        offset => offset.strip_prefix('+').unwrap_or(offset).parse::<i64>().ok()?,
    };
    Some((a, b))
}

/// True when `index == a*n + b` for some `n >= 0`.
pub fn matches_nth(a: i64, b: i64, index: i64) -> bool {
    if a == 0 {
        return index == b;
    }
    let diff = index - b;
    diff % a == 0 && diff / a >= 0
}
