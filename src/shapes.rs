//! Clip-path shapes.
//!
//! Every shape is expressed in percentages of the cell box, so the same
//! text works for any cell size.

use std::f64::consts::PI;

const DEG: f64 = PI / 180.0;

/// Names accepted by [`shape`].
pub const SHAPE_NAMES: &[&str] = &[
    "circle",
    "siogon",
    "triangle",
    "rhombus",
    "pentagon",
    "hexagon",
    "star",
    "diamond",
    "cross",
    "hypocycloid",
    "astroid",
    "clover",
];

/// Build the clip-path text of a named shape.
///
/// `args` feeds the parameterised shapes (`siogon`, `hypocycloid`,
/// `clover`); unknown names yield `None`.
///
/// # Examples
///
/// ```
/// use doodlecss::shapes::shape;
///
/// assert_eq!(shape("circle", &[]).as_deref(), Some("circle(50%)"));
/// assert!(shape("star", &[]).unwrap().starts_with("polygon("));
/// assert!(shape("blob", &[]).is_none());
/// ```
pub fn shape(name: &str, args: &[String]) -> Option<String> {
    let param = |default: i64| -> i64 {
        args.first().and_then(|a| a.trim().parse::<f64>().ok()).map(|v| v as i64).unwrap_or(default)
    };

    let text = match name {
        "circle" => circle(),
        "siogon" => siogon(param(4)),
        "triangle" => triangle(),
        "rhombus" => siogon(4),
        "pentagon" => polygon(5, DEG * 54.0, None),
        "hexagon" | "hexgon" => polygon(6, DEG * 30.0, None),
        "star" => polygon(5, DEG * 54.0, Some(DEG * 144.0)),
        "diamond" => "polygon(50% 5%, 80% 50%, 50% 95%, 20% 50%)".to_string(),
        "cross" => cross(),
        "hypocycloid" => hypocycloid(param(3)),
        "astroid" => hypocycloid(4),
        "clover" => clover(param(3)),
        _ => return None,
    };
    Some(text)
}

pub fn circle() -> String {
    "circle(50%)".to_string()
}

/// Regular polygon with `sides` clamped to 3..=12.
pub fn siogon(sides: i64) -> String {
    polygon(sides.clamp(3, 12) as usize, 0.0, None)
}

pub fn triangle() -> String {
    polygon(3, DEG * -90.0, None)
}

fn cross() -> String {
    let points = [
        (5, 35), (35, 35), (35, 5), (65, 5),
        (65, 35), (95, 35), (95, 65), (65, 65),
        (65, 95), (35, 95), (35, 65), (5, 65),
    ];
    let points: Vec<String> = points.iter().map(|(x, y)| format!("{}% {}%", x, y)).collect();
    format!("polygon({})", points.join(", "))
}

/// Points evenly spaced on the circumscribed circle, starting at `start`
/// radians and stepping `step` radians (a full turn split by `sides` if
/// omitted).
fn polygon(sides: usize, start: f64, step: Option<f64>) -> String {
    let step = step.unwrap_or(2.0 * PI / sides as f64);
    let points: Vec<String> = (0..sides)
        .map(|i| {
            let theta = start + step * i as f64;
            point(theta.cos() * 50.0 + 50.0, theta.sin() * 50.0 + 50.0)
        })
        .collect();
    format!("polygon({})", points.join(", "))
}

/// Hypocycloid with `k` cusps, `k` clamped to 3..=6.
pub fn hypocycloid(k: i64) -> String {
    let k = k.clamp(3, 6) as f64;
    let split = 120;
    let step = PI / (split as f64 / 2.0);
    let big_r = 50.0;
    let r = big_r / k;
    let points: Vec<String> = (0..split)
        .map(|i| {
            let theta = step * i as f64 + PI;
            let x = r * (1.0 - k) * theta.cos() + r * ((1.0 - k) * (theta - PI)).cos();
            let y = r * (1.0 - k) * theta.sin() + r * ((1.0 - k) * (theta - PI)).sin();
            point(x + 50.0, y + 50.0)
        })
        .collect();
    format!("polygon({})", points.join(", "))
}

/// Rose curve; 4 maps to the two-petal form, other values clamp to 3..=5.
pub fn clover(k: i64) -> String {
    let k = match k {
        4 => 2.0,
        k => k.clamp(3, 5) as f64,
    };
    let split = 240;
    let step = PI / (split as f64 / 2.0);
    let points: Vec<String> = (0..split)
        .map(|i| {
            let theta = step * i as f64;
            let x = (k * theta).cos() * theta.cos();
            let y = (k * theta).cos() * theta.sin();
            point(x * 50.0 + 50.0, y * 50.0 + 50.0)
        })
        .collect();
    format!("polygon({})", points.join(", "))
}

fn point(x: f64, y: f64) -> String {
    format!("{}% {}%", round4(x), round4(y))
}

fn round4(v: f64) -> f64 {
    let r = (v * 10_000.0).round() / 10_000.0;
    if r == 0.0 {
        0.0
    } else {
        r
    }
}
