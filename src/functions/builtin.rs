//! Builtin custom functions.

use crate::cell::Call;
use crate::expression::ExpressionEvaluator;
use crate::shapes;

use super::{format_number, parse_number_with_unit, FnResult, FunctionError, FunctionRegistry, LazyArg};

/// Upper bound on lazy repetition, keeps a typo like `@m(1e9, ...)` finite.
const MAX_REPEAT: usize = 65_536;

pub(super) fn register(registry: &mut FunctionRegistry) {
    for name in ["index", "i"] {
        registry.register_eager(name, index);
    }
    registry.register_eager("x", |call: &Call<'_>, _: &[String]| Ok(Some(call.cell.x.to_string())));
    registry.register_eager("y", |call: &Call<'_>, _: &[String]| Ok(Some(call.cell.y.to_string())));
    registry.register_eager("z", |call: &Call<'_>, _: &[String]| Ok(Some(call.cell.z.to_string())));
    registry.register_eager("row", |call: &Call<'_>, _: &[String]| Ok(Some(call.cell.x.to_string())));
    registry.register_eager("col", |call: &Call<'_>, _: &[String]| Ok(Some(call.cell.y.to_string())));
    registry.register_eager("size", |call: &Call<'_>, _: &[String]| {
        Ok(Some(call.cell.grid.count.to_string()))
    });
    registry.register_eager("size-row", |call: &Call<'_>, _: &[String]| {
        Ok(Some(call.cell.grid.x.to_string()))
    });
    registry.register_eager("size-col", |call: &Call<'_>, _: &[String]| {
        Ok(Some(call.cell.grid.y.to_string()))
    });
    registry.register_eager("n", |call: &Call<'_>, _: &[String]| Ok(call.extra.first().cloned()));
    registry.register_eager("N", |call: &Call<'_>, _: &[String]| Ok(call.extra.get(1).cloned()));

    for name in ["pick", "p"] {
        registry.register_eager(name, pick);
    }
    for name in ["pick-n", "pn"] {
        registry.register_eager(name, pick_n);
    }
    for name in ["rand", "r"] {
        registry.register_eager(name, rand);
    }
    registry.register_eager("calc", calc);
    registry.register_eager("shape", shape);

    registry.register_lazy("repeat", |call: &Call<'_>, args: &[LazyArg<'_>]| {
        repeat(call, args, "repeat", "")
    });
    for name in ["multiple", "m"] {
        registry.register_lazy(name, move |call: &Call<'_>, args: &[LazyArg<'_>]| {
            repeat(call, args, name, ",")
        });
    }
}

fn index(call: &Call<'_>, _args: &[String]) -> FnResult {
    Ok(Some(call.cell.count.to_string()))
}

/// Random choice among the arguments.
fn pick(call: &Call<'_>, args: &[String]) -> FnResult {
    Ok(call.context().random_index(args.len()).map(|i| args[i].clone()))
}

/// Sequential choice; each call site keeps its own cursor across cells.
fn pick_n(call: &Call<'_>, args: &[String]) -> FnResult {
    if args.is_empty() {
        return Ok(None);
    }
    let key = format!("pick-n:{}", call.position);
    let cursor = call.context().next_counter(&key);
    Ok(Some(args[cursor % args.len()].clone()))
}

/// `r()` in [0, 1), `r(max)` in [0, max), `r(min, max)`. Units follow the
/// first argument that carries one.
fn rand(call: &Call<'_>, args: &[String]) -> FnResult {
    let parsed: Vec<(f64, &str)> = args.iter().filter_map(|a| parse_number_with_unit(a)).collect();
    if parsed.len() != args.len() {
        return Ok(None);
    }
    let unit = parsed.iter().map(|(_, u)| *u).find(|u| !u.is_empty()).unwrap_or("");
    let (min, max) = match parsed.as_slice() {
        [] => (0.0, 1.0),
        [(max, _)] => (0.0, *max),
        [(min, _), (max, _), ..] => (*min, *max),
    };
    let value = call.context().random_range(min, max);
    Ok(format_number(value).map(|v| format!("{}{}", v, unit)))
}

fn calc(call: &Call<'_>, args: &[String]) -> FnResult {
    let Some(expr) = args.first() else {
        return Ok(None);
    };
    let value = ExpressionEvaluator::for_call(call)
        .evaluate(expr)
        .map_err(|e| FunctionError::new("calc", e.to_string()))?;
    Ok(format_number(value))
}

fn shape(_call: &Call<'_>, args: &[String]) -> FnResult {
    let Some((name, rest)) = args.split_first() else {
        return Ok(None);
    };
    Ok(shapes::shape(name.trim(), rest))
}

/// Evaluate the second argument once per index, injecting `[index, total]`.
fn repeat(_call: &Call<'_>, args: &[LazyArg<'_>], name: &str, separator: &str) -> FnResult {
    let (Some(times), Some(body)) = (args.first(), args.get(1)) else {
        return Ok(None);
    };
    let times = times.eval(&[])?;
    let Some((count, _)) = parse_number_with_unit(&times) else {
        return Ok(None);
    };
    if count < 0.0 {
        return Ok(None);
    }
    let count = count as usize;
    if count > MAX_REPEAT {
        return Err(FunctionError::new(name, format!("{} repetitions exceed the limit of {}", count, MAX_REPEAT)));
    }

    let total = count.to_string();
    let mut parts = Vec::with_capacity(count);
    for i in 1..=count {
        parts.push(body.eval(&[i.to_string(), total.clone()])?);
    }
    Ok(Some(parts.join(separator)))
}
