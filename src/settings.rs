use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DeckError;

/// Suit name of the root (header-less) section.
pub const ROOT_SUIT: &str = "/";

/// Prefix marking a suit name as relative to the last absolute suit.
pub const RELATIVE_PREFIX: &str = "..";

/// Separator used inside suit names to nest them (`physical/constants`).
pub const SUIT_SEPARATOR: char = '/';

/// Delimiter between suit and card in qualified evaluator names.
pub const QUALIFIER: char = '.';

// ── Dialect punctuation ──────────────────────────────────────────

/// Punctuation of the deck source dialect.
///
/// Every field has a default, so a JSON file only needs to name what it
/// changes: `{"continuation": "\\"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Syntax {
    /// Starts a trailing comment.
    pub comment: char,
    /// As the last character of a line, joins it with the next one.
    pub continuation: char,
    /// Opens a suit header.
    pub suit_open: char,
    /// Closes a suit header.
    pub suit_close: char,
}

impl Default for Syntax {
    fn default() -> Self {
        Self {
            comment: '#',
            continuation: '&',
            suit_open: '<',
            suit_close: '>',
        }
    }
}

impl Syntax {
    /// Load a syntax override from a JSON file.
    pub fn load(path: &Path) -> Result<Self, DeckError> {
        let data = std::fs::read_to_string(path).map_err(|source| DeckError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Render a suit header for `suit`.
    pub fn header(&self, suit: &str) -> String {
        format!("{}{suit}{}", self.suit_open, self.suit_close)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn partial_override_keeps_defaults() {
        let syntax: Syntax = serde_json::from_str(r#"{"continuation": "\\"}"#).unwrap();
        assert_eq!(syntax.continuation, '\\');
        assert_eq!(syntax.comment, '#');
        assert_eq!(syntax.header("a/b"), "<a/b>");
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("syntax.json");
        std::fs::write(&path, r#"{"suit_open": "[", "suit_close": "]"}"#).unwrap();
        let syntax = Syntax::load(&path).unwrap();
        assert_eq!(syntax.header("s"), "[s]");
    }

    #[test]
    fn load_reports_bad_json_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("syntax.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(Syntax::load(&path).unwrap_err().kind(), ErrorKind::Config);
        let missing = dir.path().join("nope.json");
        assert_eq!(Syntax::load(&missing).unwrap_err().kind(), ErrorKind::Io);
    }
}
