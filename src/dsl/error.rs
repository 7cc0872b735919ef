use thiserror::Error;

use super::ast::Span;

/// An evaluation error with its location in the statement text.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct EvalError {
    pub message: String,
    pub span: Span,
    pub kind: EvalErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalErrorKind {
    Lexer,
    Parser,
    /// Reference to a name that is not defined (yet).
    Name,
    Type,
    Call,
}

impl EvalError {
    pub fn lexer(message: impl Into<String>, span: Span) -> Self {
        Self { message: message.into(), span, kind: EvalErrorKind::Lexer }
    }

    pub fn parser(message: impl Into<String>, span: Span) -> Self {
        Self { message: message.into(), span, kind: EvalErrorKind::Parser }
    }

    pub fn name(message: impl Into<String>, span: Span) -> Self {
        Self { message: message.into(), span, kind: EvalErrorKind::Name }
    }

    pub fn type_error(message: impl Into<String>, span: Span) -> Self {
        Self { message: message.into(), span, kind: EvalErrorKind::Type }
    }

    pub fn call(message: impl Into<String>, span: Span) -> Self {
        Self { message: message.into(), span, kind: EvalErrorKind::Call }
    }

    /// Format the error with a caret under the offending part of `source`.
    pub fn format_with_source(&self, source: &str) -> String {
        let col = source.get(..self.span.start).map_or(0, |s| s.chars().count());
        let width = source
            .get(self.span.start..self.span.end)
            .map_or(1, |s| s.chars().count().max(1));
        format!(
            "[{}] {}\n  {}\n  {}{}",
            match self.kind {
                EvalErrorKind::Lexer => "lexer",
                EvalErrorKind::Parser => "parser",
                EvalErrorKind::Name => "name",
                EvalErrorKind::Type => "type",
                EvalErrorKind::Call => "call",
            },
            self.message,
            source,
            " ".repeat(col),
            "^".repeat(width),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caret_points_at_span() {
        let err = EvalError::name("Undefined name 'b'", Span::new(4, 5));
        assert_eq!(err.format_with_source("a = b + 1"), "[name] Undefined name 'b'\n  a = b + 1\n      ^");
    }
}
