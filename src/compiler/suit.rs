//! Suit headers and qualified names.

use crate::error::DeckError;
use crate::settings::{Syntax, QUALIFIER, RELATIVE_PREFIX, ROOT_SUIT, SUIT_SEPARATOR};

/// Current suit and the absolute suit relative headers resolve against.
#[derive(Debug)]
pub struct SuitState {
    current: String,
    anchor: Option<String>,
}

impl Default for SuitState {
    fn default() -> Self {
        Self {
            current: ROOT_SUIT.to_string(),
            anchor: None,
        }
    }
}

impl SuitState {
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Switch to the suit a header names and return its resolved name.
    ///
    /// `..rest` resolves to `anchor + rest` and leaves the anchor alone, so a
    /// run of relative headers all hang off the same absolute suit.
    /// Suit names may not contain the qualifier `.`, which would make their
    /// cards unqualify into a different suit.
    pub fn enter(&mut self, name: &str, line: usize) -> Result<&str, DeckError> {
        let (resolved, absolute) = match name.strip_prefix(RELATIVE_PREFIX) {
            Some(rest) => {
                let Some(anchor) = &self.anchor else {
                    return Err(DeckError::suit(
                        line,
                        format!("cannot use '{RELATIVE_PREFIX}' in '{name}' before any suit is declared"),
                    ));
                };
                (format!("{anchor}{rest}"), false)
            }
            None => (name.to_string(), true),
        };
        if resolved.contains(QUALIFIER) {
            return Err(DeckError::suit(
                line,
                format!("cannot have '{QUALIFIER}' in suit name '{resolved}'"),
            ));
        }
        if absolute {
            self.anchor = Some(resolved.clone());
        }
        self.current = resolved;
        Ok(&self.current)
    }
}

/// Name inside a header line, or `None` if `text` is not a header.
pub fn parse_header(text: &str, syntax: &Syntax, line: usize) -> Result<Option<String>, DeckError> {
    let Some(body) = text.trim_start().strip_prefix(syntax.suit_open) else {
        return Ok(None);
    };
    let Some(close) = body.find(syntax.suit_close) else {
        return Err(DeckError::suit(
            line,
            format!("missing '{}' in suit declaration", syntax.suit_close),
        ));
    };
    let name: String = body.get(..close).unwrap_or_default().chars().filter(|c| !c.is_whitespace()).collect();
    if name.is_empty() {
        return Err(DeckError::suit(line, "empty suit name"));
    }
    Ok(Some(name))
}

/// Evaluator name of a card: `a/b` + `x` is `a.b.x`; root cards stay bare.
pub fn qualify(suit: &str, name: &str) -> String {
    if suit.is_empty() || suit == ROOT_SUIT {
        return name.to_string();
    }
    let prefix: String = suit
        .chars()
        .map(|c| if c == SUIT_SEPARATOR { QUALIFIER } else { c })
        .collect();
    format!("{prefix}{QUALIFIER}{name}")
}

/// Inverse of [`qualify`]: split at the last qualifier outside brackets.
pub fn unqualify(qualified: &str) -> (String, String) {
    let mut depth = 0usize;
    let mut split = None;
    for (i, ch) in qualified.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            c if c == QUALIFIER && depth == 0 => split = Some(i),
            _ => {}
        }
    }
    match split {
        Some(at) => {
            let suit = qualified
                .get(..at)
                .unwrap_or_default()
                .chars()
                .map(|c| if c == QUALIFIER { SUIT_SEPARATOR } else { c })
                .collect();
            let name = qualified.get(at + QUALIFIER.len_utf8()..).unwrap_or_default().to_string();
            (suit, name)
        }
        None => (ROOT_SUIT.to_string(), qualified.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn headers() {
        let syntax = Syntax::default();
        assert_eq!(parse_header("<suit1>", &syntax, 0).unwrap(), Some("suit1".into()));
        assert_eq!(parse_header("< a / b >", &syntax, 0).unwrap(), Some("a/b".into()));
        assert_eq!(parse_header("a = 1 < 2", &syntax, 0).unwrap(), None);
        let err = parse_header("<suit", &syntax, 3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedSuit);
        assert_eq!(err.line(), Some(3));
        assert!(parse_header("< >", &syntax, 0).is_err());
    }

    #[test]
    fn relative_suits_share_an_anchor() {
        let mut state = SuitState::default();
        assert_eq!(state.current(), ROOT_SUIT);
        state.enter("outer", 0).unwrap();
        assert_eq!(state.enter("../inner", 1).unwrap(), "outer/inner");
        assert_eq!(state.enter("../other", 2).unwrap(), "outer/other");
        assert_eq!(state.enter("..x", 3).unwrap(), "outerx");
        state.enter("next", 4).unwrap();
        assert_eq!(state.enter("../y", 5).unwrap(), "next/y");
    }

    #[test]
    fn relative_without_anchor_fails() {
        let mut state = SuitState::default();
        let err = state.enter("../inner", 7).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedSuit);
        assert_eq!(err.line(), Some(7));
    }

    #[test]
    fn qualifier_in_suit_name_is_rejected() {
        let mut state = SuitState::default();
        let err = state.enter("a.b", 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedSuit);
        assert_eq!(err.line(), Some(2));
        assert_eq!(state.current(), ROOT_SUIT);

        state.enter("outer", 3).unwrap();
        assert!(state.enter("...x", 4).is_err());
        assert!(state.enter("../a.b", 5).is_err());
        assert_eq!(state.enter("../ok", 6).unwrap(), "outer/ok");
    }

    #[test]
    fn qualified_names_round_trip() {
        assert_eq!(qualify("/", "a"), "a");
        assert_eq!(qualify("physical/constants", "c"), "physical.constants.c");
        assert_eq!(unqualify("physical.constants.c"), ("physical/constants".into(), "c".into()));
        assert_eq!(unqualify("s.v[2]"), ("s".into(), "v[2]".into()));
        assert_eq!(unqualify("a"), ("/".into(), "a".into()));
    }
}
