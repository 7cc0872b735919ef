/// Decimal digits needed to round-trip any `f64` through text.
pub const MAX_DIGITS10: usize = 17;

/// Most digits after the point a rendering will use; enough to print any
/// `f64` exactly.
pub const MAX_PRECISION: usize = 767;

/// Largest magnitude below which every integral `f64` is exactly an `i64`.
const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

/// Format a number as cards render it.
///
/// Integral values print without a fractional part (`42`, `-3`). Anything
/// else prints in scientific notation with `precision` digits after the
/// point and a signed, at-least-two-digit exponent (`1.10000000000000009e+00`).
/// `precision` is capped at [`MAX_PRECISION`].
pub fn format_number(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value.fract() == 0.0 && value.abs() < EXACT_INTEGER_LIMIT {
        return format!("{}", value as i64);
    }
    let precision = precision.min(MAX_PRECISION);
    let raw = format!("{value:.precision$e}");
    match raw.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exponent.abs())
        }
        None => raw,
    }
}
