#[allow(clippy::module_name_repetitions)]
pub mod ast;
#[allow(clippy::module_name_repetitions)]
pub mod error;
#[allow(
    clippy::indexing_slicing,
    clippy::single_match_else,
    clippy::module_name_repetitions,
)]
pub mod lexer;
#[allow(
    clippy::indexing_slicing,
    clippy::wildcard_imports,
    clippy::single_match_else,
    clippy::needless_pass_by_value,
)]
pub mod parser;
#[allow(clippy::indexing_slicing)]
pub mod builtins;
#[allow(
    clippy::indexing_slicing,
    clippy::wildcard_imports,
    clippy::float_cmp,
)]
pub mod interpreter;

use indexmap::IndexMap;

use crate::model::Value;
use error::EvalError;

pub use interpreter::Interpreter;

/// Names visible to the evaluator, mapped to their current values.
///
/// Keys are qualified card names (`suit.card`, `suit.v[2]`) for globals and
/// bare card names for locals.
pub type SymbolTable = IndexMap<String, Value>;

/// Expression evaluator the deck compiler drives.
///
/// A statement is either `name = expr`, which stores the result into
/// `globals` and yields `None`, or a bare expression, which yields its
/// value. Names resolve against `locals` first, then `globals`.
pub trait Evaluator {
    fn interpret(
        &self,
        statement: &str,
        globals: &mut SymbolTable,
        locals: Option<&SymbolTable>,
    ) -> Result<Option<Value>, EvalError>;
}

impl<E: Evaluator + ?Sized> Evaluator for &E {
    fn interpret(
        &self,
        statement: &str,
        globals: &mut SymbolTable,
        locals: Option<&SymbolTable>,
    ) -> Result<Option<Value>, EvalError> {
        (**self).interpret(statement, globals, locals)
    }
}

/// Run one statement with the built-in [`Interpreter`].
///
/// source → lex → parse → evaluate
pub fn interpret(
    statement: &str,
    globals: &mut SymbolTable,
    locals: Option<&SymbolTable>,
) -> Result<Option<Value>, EvalError> {
    Interpreter.interpret(statement, globals, locals)
}
