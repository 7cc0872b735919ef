use std::f64::consts;

/// Operation behind a builtin name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Sin,
    Cos,
    Tan,
    Abs,
    Floor,
    Ceil,
    Round,
    Sqrt,
    Exp,
    Log,
    Log10,
    Pow,
    Min,
    Max,
    Atan2,
    Clamp,
    /// Writes its argument to stdout and returns it unchanged.
    Print,
}

impl Op {
    /// Apply a numeric builtin. Arity has already been checked against the
    /// table entry.
    pub fn apply(self, args: &[f64]) -> f64 {
        match self {
            Op::Sin => args[0].sin(),
            Op::Cos => args[0].cos(),
            Op::Tan => args[0].tan(),
            Op::Abs => args[0].abs(),
            Op::Floor => args[0].floor(),
            Op::Ceil => args[0].ceil(),
            Op::Round => args[0].round(),
            Op::Sqrt => args[0].sqrt(),
            Op::Exp => args[0].exp(),
            Op::Log => args[0].ln(),
            Op::Log10 => args[0].log10(),
            Op::Pow => args[0].powf(args[1]),
            Op::Min => args[0].min(args[1]),
            Op::Max => args[0].max(args[1]),
            Op::Atan2 => args[0].atan2(args[1]),
            Op::Clamp => args[0].max(args[1]).min(args[2]),
            Op::Print => args[0],
        }
    }
}

/// Built-in function: name, parameter names, and the operation it runs.
#[derive(Debug, Clone)]
pub struct BuiltinFn {
    pub name: &'static str,
    pub params: &'static [&'static str],
    pub op: Op,
    pub category: &'static str,
    pub description: &'static str,
}

/// All built-in functions callable from card expressions.
pub static BUILTINS: &[BuiltinFn] = &[
    // ── Math (1-arg) ────────────────────────────────────────────
    BuiltinFn { name: "sin", params: &["x"], op: Op::Sin, category: "math", description: "Sine" },
    BuiltinFn { name: "cos", params: &["x"], op: Op::Cos, category: "math", description: "Cosine" },
    BuiltinFn { name: "tan", params: &["x"], op: Op::Tan, category: "math", description: "Tangent" },
    BuiltinFn { name: "abs", params: &["x"], op: Op::Abs, category: "math", description: "Absolute value" },
    BuiltinFn { name: "floor", params: &["x"], op: Op::Floor, category: "math", description: "Round down" },
    BuiltinFn { name: "ceil", params: &["x"], op: Op::Ceil, category: "math", description: "Round up" },
    BuiltinFn { name: "round", params: &["x"], op: Op::Round, category: "math", description: "Round to nearest" },
    BuiltinFn { name: "sqrt", params: &["x"], op: Op::Sqrt, category: "math", description: "Square root" },
    BuiltinFn { name: "exp", params: &["x"], op: Op::Exp, category: "math", description: "e raised to x" },
    BuiltinFn { name: "log", params: &["x"], op: Op::Log, category: "math", description: "Natural logarithm" },
    BuiltinFn { name: "log10", params: &["x"], op: Op::Log10, category: "math", description: "Base-10 logarithm" },
    // ── Math (multi-arg) ────────────────────────────────────────
    BuiltinFn { name: "pow", params: &["x", "y"], op: Op::Pow, category: "math", description: "x raised to y" },
    BuiltinFn { name: "min", params: &["a", "b"], op: Op::Min, category: "math", description: "Smaller of two numbers" },
    BuiltinFn { name: "max", params: &["a", "b"], op: Op::Max, category: "math", description: "Larger of two numbers" },
    BuiltinFn { name: "atan2", params: &["y", "x"], op: Op::Atan2, category: "math", description: "Angle of (x, y)" },
    BuiltinFn {
        name: "clamp", params: &["x", "lo", "hi"], op: Op::Clamp,
        category: "math", description: "Limit x to [lo, hi]",
    },
    // ── I/O ─────────────────────────────────────────────────────
    BuiltinFn { name: "print", params: &["x"], op: Op::Print, category: "io", description: "Print x and return it" },
];

/// Named constants visible when no card of the same name exists.
pub static CONSTANTS: &[(&str, f64)] = &[("pi", consts::PI), ("e", consts::E)];

pub fn lookup(name: &str) -> Option<&'static BuiltinFn> {
    BUILTINS.iter().find(|b| b.name == name)
}

pub fn constant(name: &str) -> Option<f64> {
    CONSTANTS.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        for (i, a) in BUILTINS.iter().enumerate() {
            for b in BUILTINS.iter().skip(i + 1) {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn apply_math() {
        assert_eq!(lookup("max").unwrap().op.apply(&[2.0, 5.0]), 5.0);
        assert_eq!(lookup("clamp").unwrap().op.apply(&[7.0, 0.0, 3.0]), 3.0);
        assert_eq!(lookup("sqrt").unwrap().op.apply(&[16.0]), 4.0);
        assert!(lookup("nope").is_none());
    }

    #[test]
    fn every_builtin_is_described() {
        for builtin in BUILTINS {
            assert!(!builtin.description.is_empty(), "{}", builtin.name);
            assert!(matches!(builtin.category, "math" | "io"), "{}", builtin.name);
        }
        assert_eq!(lookup("print").unwrap().category, "io");
    }

    #[test]
    fn constants() {
        assert_eq!(constant("pi"), Some(consts::PI));
        assert_eq!(constant("tau"), None);
    }
}
