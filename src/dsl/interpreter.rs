//! Tree-walking evaluator for card expressions.

use super::ast::*;
use super::builtins::{self, Op};
use super::error::EvalError;
use super::lexer::lex;
use super::parser::parse;
use super::{Evaluator, SymbolTable};
use crate::model::Value;

/// The built-in evaluator.
///
/// Stateless: every call lexes and parses its statement afresh, reads names
/// from the tables it is handed, and writes assignments into `globals`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Interpreter;

impl Evaluator for Interpreter {
    fn interpret(
        &self,
        statement: &str,
        globals: &mut SymbolTable,
        locals: Option<&SymbolTable>,
    ) -> Result<Option<Value>, EvalError> {
        let stmt = parse(lex(statement)?)?;
        match stmt {
            Stmt::Assign { name, value, .. } => {
                let result = Scope { globals: &*globals, locals }.eval(&value)?;
                globals.insert(name, result);
                Ok(None)
            }
            Stmt::Expr(expr) => Scope { globals: &*globals, locals }.eval(&expr).map(Some),
        }
    }
}

struct Scope<'a> {
    globals: &'a SymbolTable,
    locals: Option<&'a SymbolTable>,
}

impl Scope<'_> {
    fn eval(&self, expr: &Expr) -> Result<Value, EvalError> {
        match &expr.kind {
            ExprKind::Number(v) => Ok(Value::Number(*v)),
            ExprKind::Str(s) => Ok(Value::String(s.clone())),
            ExprKind::Bool(b) => Ok(Value::Boolean(*b)),
            ExprKind::Name(name) => self.lookup(name, expr.span),
            ExprKind::UnaryOp { op, operand } => {
                let value = self.eval(operand)?;
                match (op, &value) {
                    (UnaryOp::Neg, Value::Number(v)) => Ok(Value::Number(-v)),
                    (UnaryOp::Not, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
                    (UnaryOp::Neg, _) => Err(EvalError::type_error(
                        format!("Cannot negate a {}", value.type_name()),
                        expr.span,
                    )),
                    (UnaryOp::Not, _) => Err(EvalError::type_error(
                        format!("'!' expects a boolean, got a {}", value.type_name()),
                        expr.span,
                    )),
                }
            }
            ExprKind::BinOp { op, left, right } => self.eval_binop(*op, left, right, expr.span),
            ExprKind::Call { name, args } => self.eval_call(name, args, expr.span),
        }
    }

    fn lookup(&self, name: &str, span: Span) -> Result<Value, EvalError> {
        if let Some(v) = self.locals.and_then(|l| l.get(name)) {
            return Ok(v.clone());
        }
        if let Some(v) = self.globals.get(name) {
            return Ok(v.clone());
        }
        builtins::constant(name)
            .map(Value::Number)
            .ok_or_else(|| EvalError::name(format!("Undefined name '{name}'"), span))
    }

    fn eval_binop(&self, op: BinOp, left: &Expr, right: &Expr, span: Span) -> Result<Value, EvalError> {
        if matches!(op, BinOp::And | BinOp::Or) {
            let lhs = self.expect_bool(op, left)?;
            // Short-circuit
            if (op == BinOp::And && !lhs) || (op == BinOp::Or && lhs) {
                return Ok(Value::Boolean(lhs));
            }
            return Ok(Value::Boolean(self.expect_bool(op, right)?));
        }

        let lhs = self.eval(left)?;
        let rhs = self.eval(right)?;
        let mismatch = || {
            EvalError::type_error(
                format!(
                    "Operator '{}' cannot combine {} and {}",
                    op.symbol(),
                    lhs.type_name(),
                    rhs.type_name()
                ),
                span,
            )
        };

        match (&lhs, &rhs) {
            (Value::Number(a), Value::Number(b)) => {
                let (a, b) = (*a, *b);
                Ok(match op {
                    BinOp::Add => Value::Number(a + b),
                    BinOp::Sub => Value::Number(a - b),
                    BinOp::Mul => Value::Number(a * b),
                    BinOp::Div => Value::Number(a / b),
                    BinOp::Mod => Value::Number(a % b),
                    BinOp::Pow => Value::Number(a.powf(b)),
                    BinOp::Lt => Value::Boolean(a < b),
                    BinOp::Gt => Value::Boolean(a > b),
                    BinOp::Le => Value::Boolean(a <= b),
                    BinOp::Ge => Value::Boolean(a >= b),
                    BinOp::Eq => Value::Boolean(a == b),
                    BinOp::Ne => Value::Boolean(a != b),
                    BinOp::And | BinOp::Or => return Err(mismatch()),
                })
            }
            (Value::String(a), Value::String(b)) => match op {
                BinOp::Add => Ok(Value::String(format!("{a}{b}"))),
                BinOp::Lt => Ok(Value::Boolean(a < b)),
                BinOp::Gt => Ok(Value::Boolean(a > b)),
                BinOp::Le => Ok(Value::Boolean(a <= b)),
                BinOp::Ge => Ok(Value::Boolean(a >= b)),
                BinOp::Eq => Ok(Value::Boolean(a == b)),
                BinOp::Ne => Ok(Value::Boolean(a != b)),
                _ => Err(mismatch()),
            },
            (Value::Boolean(a), Value::Boolean(b)) => match op {
                BinOp::Eq => Ok(Value::Boolean(a == b)),
                BinOp::Ne => Ok(Value::Boolean(a != b)),
                _ => Err(mismatch()),
            },
            _ => Err(mismatch()),
        }
    }

    fn expect_bool(&self, op: BinOp, expr: &Expr) -> Result<bool, EvalError> {
        let value = self.eval(expr)?;
        value.as_bool().ok_or_else(|| {
            EvalError::type_error(
                format!("'{}' expects booleans, got a {}", op.symbol(), value.type_name()),
                expr.span,
            )
        })
    }

    fn eval_call(&self, name: &str, args: &[Expr], span: Span) -> Result<Value, EvalError> {
        let builtin = builtins::lookup(name)
            .ok_or_else(|| EvalError::call(format!("Unknown function '{name}'"), span))?;
        if args.len() != builtin.params.len() {
            return Err(EvalError::call(
                format!(
                    "'{name}' takes {} argument(s), got {}",
                    builtin.params.len(),
                    args.len()
                ),
                span,
            ));
        }

        if builtin.op == Op::Print {
            let value = self.eval(&args[0])?;
            println!("{value}");
            return Ok(value);
        }

        let mut numbers = Vec::with_capacity(args.len());
        for (arg, param) in args.iter().zip(builtin.params) {
            let value = self.eval(arg)?;
            let n = match value {
                Value::Number(n) => n,
                other => {
                    return Err(EvalError::type_error(
                        format!("'{name}' expects a number for '{param}', got a {}", other.type_name()),
                        arg.span,
                    ))
                }
            };
            numbers.push(n);
        }
        Ok(Value::Number(builtin.op.apply(&numbers)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::dsl::error::EvalErrorKind;

    fn eval(statement: &str) -> Value {
        let mut globals = SymbolTable::new();
        Interpreter.interpret(statement, &mut globals, None).unwrap().unwrap()
    }

    fn eval_err(statement: &str) -> EvalErrorKind {
        let mut globals = SymbolTable::new();
        Interpreter.interpret(statement, &mut globals, None).unwrap_err().kind
    }

    #[test]
    fn arithmetic() {
        assert_eq!(eval("1 + 2 * 3"), Value::Number(7.0));
        assert_eq!(eval("(1 + 2) * 3"), Value::Number(9.0));
        assert_eq!(eval("2 ** 3 ** 2"), Value::Number(512.0));
        assert_eq!(eval("2 ^ -1"), Value::Number(0.5));
        assert_eq!(eval("-2 ** 2"), Value::Number(-4.0));
        assert_eq!(eval("7 % 4"), Value::Number(3.0));
        assert_eq!(eval("3e8 / 1e8"), Value::Number(3.0));
    }

    #[test]
    fn strings_and_booleans() {
        assert_eq!(eval("\"ab\" + \"cd\""), Value::String("abcd".into()));
        assert_eq!(eval("1 < 2 && !false"), Value::Boolean(true));
        assert_eq!(eval("\"a\" == \"a\" || 1 / 0 > 0"), Value::Boolean(true));
        assert_eq!(eval("true != false"), Value::Boolean(true));
    }

    #[test]
    fn builtins_and_constants() {
        assert_eq!(eval("max(2, sqrt(16))"), Value::Number(4.0));
        assert_eq!(eval("floor(pi)"), Value::Number(3.0));
        assert_eq!(eval("print(\"hi\")"), Value::String("hi".into()));
    }

    #[test]
    fn assignment_writes_globals() {
        let mut globals = SymbolTable::new();
        let out = Interpreter.interpret("s.a = 4", &mut globals, None).unwrap();
        assert!(out.is_none());
        Interpreter.interpret("s.b = s.a * 2", &mut globals, None).unwrap();
        assert_eq!(globals.get("s.b"), Some(&Value::Number(8.0)));
    }

    #[test]
    fn locals_shadow_globals() {
        let mut globals = SymbolTable::new();
        globals.insert("x".into(), Value::Number(1.0));
        let mut locals = SymbolTable::new();
        locals.insert("x".into(), Value::Number(10.0));
        let v = Interpreter.interpret("x + 1", &mut globals, Some(&locals)).unwrap();
        assert_eq!(v, Some(Value::Number(11.0)));
        let v = Interpreter.interpret("x + 1", &mut globals, None).unwrap();
        assert_eq!(v, Some(Value::Number(2.0)));
    }

    #[test]
    fn a_card_named_like_a_constant_wins() {
        let mut globals = SymbolTable::new();
        globals.insert("e".into(), Value::Number(5.0));
        let v = Interpreter.interpret("e", &mut globals, None).unwrap();
        assert_eq!(v, Some(Value::Number(5.0)));
    }

    #[test]
    fn errors() {
        assert_eq!(eval_err("nope + 1"), EvalErrorKind::Name);
        assert_eq!(eval_err("1 + \"a\""), EvalErrorKind::Type);
        assert_eq!(eval_err("\"a\" - \"b\""), EvalErrorKind::Type);
        assert_eq!(eval_err("1 && true"), EvalErrorKind::Type);
        assert_eq!(eval_err("!1"), EvalErrorKind::Type);
        assert_eq!(eval_err("frobnicate(1)"), EvalErrorKind::Call);
        assert_eq!(eval_err("max(1)"), EvalErrorKind::Call);
        assert_eq!(eval_err("sin(\"x\")"), EvalErrorKind::Type);
        assert_eq!(eval_err("1 +"), EvalErrorKind::Parser);
        assert_eq!(eval_err("\"open"), EvalErrorKind::Lexer);
    }
}
