use std::path::PathBuf;

use thiserror::Error;

use crate::dsl::error::EvalError;

/// Every failure the deck compiler and store can report.
///
/// Line numbers are 0-based positions in the input stream.
#[derive(Debug, Error)]
pub enum DeckError {
    #[error("malformed suit declaration at line {line}: {message}")]
    MalformedSuit { line: usize, message: String },

    #[error("malformed card declaration at line {line}: {message}")]
    MalformedCard { line: usize, message: String },

    #[error("failed to compile expression '{statement}' at line {line}: {source}")]
    Eval {
        statement: String,
        line: usize,
        #[source]
        source: EvalError,
    },

    #[error("failed to compile expression '{statement}' at line {line}: {source}\npossibly missing '=' in card declaration")]
    BareStatement {
        statement: String,
        line: usize,
        #[source]
        source: EvalError,
    },

    #[error("failed to compile expression '{statement}': {source}")]
    Statement {
        statement: String,
        #[source]
        source: EvalError,
    },

    #[error("suit '{suit}' not found in the deck")]
    SuitNotFound { suit: String },

    #[error("card '{name}' not found in suit '{suit}'")]
    CardNotFound { suit: String, name: String },

    #[error("card {suit}/{name} holds a {found} value and cannot be read as {expected}")]
    TypeMismatch {
        suit: String,
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("could not open file '{}': {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid syntax configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Coarse classification of a [`DeckError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedSuit,
    MalformedCard,
    Evaluator,
    Lookup,
    TypeDecode,
    Io,
    Config,
}

impl DeckError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeckError::MalformedSuit { .. } => ErrorKind::MalformedSuit,
            DeckError::MalformedCard { .. } => ErrorKind::MalformedCard,
            DeckError::Eval { .. } | DeckError::BareStatement { .. } | DeckError::Statement { .. } => {
                ErrorKind::Evaluator
            }
            DeckError::SuitNotFound { .. } | DeckError::CardNotFound { .. } => ErrorKind::Lookup,
            DeckError::TypeMismatch { .. } => ErrorKind::TypeDecode,
            DeckError::Open { .. } | DeckError::Io(_) => ErrorKind::Io,
            DeckError::Config(_) => ErrorKind::Config,
        }
    }

    /// Source line the error was raised at, when it came from compilation.
    pub fn line(&self) -> Option<usize> {
        match self {
            DeckError::MalformedSuit { line, .. }
            | DeckError::MalformedCard { line, .. }
            | DeckError::Eval { line, .. }
            | DeckError::BareStatement { line, .. } => Some(*line),
            _ => None,
        }
    }

    pub(crate) fn suit(line: usize, message: impl Into<String>) -> Self {
        DeckError::MalformedSuit { line, message: message.into() }
    }

    pub(crate) fn card(line: usize, message: impl Into<String>) -> Self {
        DeckError::MalformedCard { line, message: message.into() }
    }

    pub(crate) fn suit_not_found(suit: &str) -> Self {
        DeckError::SuitNotFound { suit: suit.to_string() }
    }

    pub(crate) fn card_not_found(suit: &str, name: &str) -> Self {
        DeckError::CardNotFound { suit: suit.to_string(), name: name.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_and_lines() {
        let err = DeckError::card(4, "empty card name");
        assert_eq!(err.kind(), ErrorKind::MalformedCard);
        assert_eq!(err.line(), Some(4));
        assert_eq!(err.to_string(), "malformed card declaration at line 4: empty card name");

        let err = DeckError::suit_not_found("suit9");
        assert_eq!(err.kind(), ErrorKind::Lookup);
        assert_eq!(err.line(), None);
        assert_eq!(err.to_string(), "suit 'suit9' not found in the deck");
    }
}
