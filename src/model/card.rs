use serde::{Deserialize, Serialize};

use super::value::{FromValue, Value};
use crate::error::DeckError;
use crate::util::MAX_DIGITS10;

/// One compiled declaration: a value filed under `suit`/`name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub suit: String,
    pub name: String,
    value: Value,
    /// Input line the card was compiled from; `None` for cards added through
    /// the API.
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    comment: String,
}

impl Card {
    pub fn new(suit: impl Into<String>, name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            suit: suit.into(),
            name: name.into(),
            value: value.into(),
            line: None,
            comment: String::new(),
        }
    }

    pub fn with_line(mut self, line: Option<usize>) -> Self {
        self.line = line;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<Value>) {
        self.value = value.into();
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
    }

    pub fn is_string(&self) -> bool {
        self.value.is_string()
    }

    /// Decode the value as `T`.
    pub fn get<T: FromValue>(&self) -> Result<T, DeckError> {
        T::from_value(&self.value).ok_or_else(|| DeckError::TypeMismatch {
            suit: self.suit.clone(),
            name: self.name.clone(),
            expected: T::EXPECTED,
            found: self.value.type_name(),
        })
    }

    pub fn get_string(&self) -> String {
        self.value.render(MAX_DIGITS10)
    }

    pub fn get_string_with_precision(&self, precision: usize) -> String {
        self.value.render(precision)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn constructor_and_accessors() {
        let card = Card::new("hearts", "ace", 1.0).with_line(Some(5));
        assert_eq!(card.suit, "hearts");
        assert_eq!(card.name, "ace");
        assert_eq!(card.line, Some(5));
        assert_eq!(card.get::<i32>().unwrap(), 1);
        assert_eq!(card.get_string(), "1");

        let copy = card.clone();
        assert_eq!(copy, card);
        assert_eq!(copy.get::<f64>().unwrap(), 1.0);
    }

    #[test]
    fn different_value_types() {
        let string_card = Card::new("spades", "king", "face");
        let bool_card = Card::new("clubs", "joker", true);
        let int_card = Card::new("diamonds", "ten", 10);

        assert_eq!(string_card.get_string(), "face");
        assert_eq!(bool_card.get_string(), "true");
        assert_eq!(int_card.get_string(), "10");

        assert_eq!(string_card.get::<String>().unwrap(), "face");
        assert!(bool_card.get::<bool>().unwrap());
        assert_eq!(int_card.get::<i32>().unwrap(), 10);
        assert!(string_card.is_string());
    }

    #[test]
    fn mismatch_names_the_card() {
        let card = Card::new("spades", "king", "face");
        let err = card.get::<f64>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeDecode);
        assert_eq!(err.to_string(), "card spades/king holds a string value and cannot be read as f64");
    }

    #[test]
    fn precision_and_comments() {
        let mut card = Card::new("/", "ratio", 1.1);
        assert_eq!(card.get_string(), "1.10000000000000009e+00");
        assert_eq!(card.get_string_with_precision(3), "1.100e+00");
        assert_eq!(card.get_string_with_precision(70_000), card.get_string_with_precision(767));
        card.set_comment("approximately");
        assert_eq!(card.comment(), "approximately");
    }
}
