//! Deck → source text.

use std::io::Write;

use super::deck::Deck;
use super::value::Value;
use crate::error::DeckError;
use crate::settings::ROOT_SUIT;

impl Deck {
    /// Write the deck back out in its source dialect.
    ///
    /// Suits come in declaration order, the root suit without a header.
    /// Continuations and source spacing are not reproduced.
    pub fn write_deck<W: Write>(&self, mut out: W) -> Result<(), DeckError> {
        let syntax = self.syntax();
        for (suit, cards) in self.iter() {
            if suit != ROOT_SUIT {
                writeln!(out, "{}", syntax.header(suit))?;
            }
            for card in cards.values() {
                match card.value() {
                    Value::String(s) => write!(out, "{} = \"{s}\"", card.name)?,
                    Value::Number(n) if !n.is_finite() => write!(out, "{} = {}", card.name, non_finite(*n))?,
                    _ => write!(out, "{} = {}", card.name, card.get_string())?,
                }
                if !card.comment().is_empty() {
                    write!(out, "  {} {}", syntax.comment, card.comment())?;
                }
                writeln!(out)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

/// Expression that evaluates back to an infinite or NaN number.
fn non_finite(n: f64) -> &'static str {
    if n.is_nan() {
        "0/0"
    } else if n > 0.0 {
        "1/0"
    } else {
        "-1/0"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use crate::model::Deck;

    #[test]
    fn writes_suits_in_order() {
        let mut deck = Deck::new();
        deck.build("g = 2 # root\n<s/t>\nname = \"hi there\"\nflag = true\nr = 0.5 * 3\nv = [1, 2]\n").unwrap();
        let text = deck.to_string();
        assert_eq!(
            text,
            "g = 2  # root\n\n<s/t>\nname = \"hi there\"\nflag = true\nr = 1.50000000000000000e+00\nv[0] = 1\nv[1] = 2\n\n"
        );
    }

    #[test]
    fn output_compiles_back_to_the_same_cards() {
        let mut deck = Deck::new();
        deck.build("a = 1 / 3 # third\n<x>\nb = \"s\"\nc = [a, 2]\n<..y>\nd = false\n").unwrap();
        let mut out = Vec::new();
        deck.write_deck(&mut out).unwrap();

        let mut again = Deck::new();
        again.build(std::str::from_utf8(&out).unwrap()).unwrap();
        assert_eq!(again.suits(), deck.suits());
        for (suit, cards) in deck.iter() {
            for card in cards.values() {
                let other = again.get_card(suit, &card.name).unwrap();
                assert_eq!(other.value(), card.value());
                assert_eq!(other.comment(), card.comment());
            }
        }
    }

    #[test]
    fn non_finite_numbers_compile_back() {
        let mut deck = Deck::new();
        deck.build("p = 1 / 0\nn = -1 / 0\nz = 0 / 0\n").unwrap();
        let text = deck.to_string();
        assert_eq!(text, "p = 1/0\nn = -1/0\nz = 0/0\n\n");

        let mut again = Deck::new();
        again.build(&text).unwrap();
        assert_eq!(again.get_card_value::<f64>("/", "p").unwrap(), f64::INFINITY);
        assert_eq!(again.get_card_value::<f64>("/", "n").unwrap(), f64::NEG_INFINITY);
        assert!(again.get_card_value::<f64>("/", "z").unwrap().is_nan());
    }

    #[test]
    fn empty_suits_are_skipped() {
        let mut deck = Deck::new();
        deck.build("<empty>\n<full>\nx = 1\n").unwrap();
        assert_eq!(deck.to_string(), "<full>\nx = 1\n\n");
    }
}
