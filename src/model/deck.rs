use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::card::Card;
use super::value::{FromValue, Value};
use crate::compiler::{self, Session};
use crate::dsl::{Evaluator, Interpreter};
use crate::error::DeckError;
use crate::settings::{Syntax, ROOT_SUIT};

/// Cards of one suit by local name, in the order they were first defined.
pub type Suit = IndexMap<String, Card>;

/// A compiled deck: suits in declaration order, each holding its cards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deck {
    suits: Vec<String>,
    table: IndexMap<String, Suit>,
    #[serde(skip)]
    syntax: Syntax,
}

impl Default for Deck {
    fn default() -> Self {
        Self::with_syntax(Syntax::default())
    }
}

impl Deck {
    /// An empty deck holding only the root suit.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_syntax(syntax: Syntax) -> Self {
        Self {
            suits: vec![ROOT_SUIT.to_string()],
            table: IndexMap::new(),
            syntax,
        }
    }

    pub fn syntax(&self) -> &Syntax {
        &self.syntax
    }

    // ── Building ─────────────────────────────────────────────────

    /// Compile `source` on top of the current cards.
    pub fn build(&mut self, source: &str) -> Result<(), DeckError> {
        self.build_with(&Interpreter, &mut [&mut source.as_bytes()])
    }

    pub fn build_reader(&mut self, mut reader: impl BufRead) -> Result<(), DeckError> {
        self.build_with(&Interpreter, &mut [&mut reader])
    }

    /// Compile `prelude`, then `source`, as one build.
    pub fn build_with_prelude(&mut self, source: &str, prelude: &str) -> Result<(), DeckError> {
        self.build_with(&Interpreter, &mut [&mut prelude.as_bytes(), &mut source.as_bytes()])
    }

    pub fn build_reader_with_prelude(
        &mut self,
        mut reader: impl BufRead,
        mut prelude: impl BufRead,
    ) -> Result<(), DeckError> {
        self.build_with(&Interpreter, &mut [&mut prelude, &mut reader])
    }

    /// Compile `prelude`, then the file at `path`.
    pub fn build_file(&mut self, path: impl AsRef<Path>, prelude: &str) -> Result<(), DeckError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DeckError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        self.build_with(&Interpreter, &mut [&mut prelude.as_bytes(), &mut BufReader::new(file)])
    }

    /// Compile `sources` in order with `evaluator`.
    ///
    /// The build runs against a session seeded from this deck and only
    /// replaces the deck once every source compiled. On error the deck is
    /// left as it was.
    pub fn build_with<E: Evaluator + ?Sized>(
        &mut self,
        evaluator: &E,
        sources: &mut [&mut dyn BufRead],
    ) -> Result<(), DeckError> {
        let mut session = Session::seed(self);
        for source in sources.iter_mut() {
            compiler::compile(evaluator, &self.syntax, &mut session, &mut **source)?;
        }
        *self = session.into_deck(self.syntax.clone());
        info!(suits = self.suits.len(), cards = self.card_count(), "deck built");
        Ok(())
    }

    /// Run one statement against the deck's cards and fold every result
    /// back in. Existing cards keep their comment and line.
    pub fn recompile_card(&mut self, statement: &str) -> Result<Option<Value>, DeckError> {
        self.recompile_card_with(&Interpreter, statement)
    }

    pub fn recompile_card_with<E: Evaluator + ?Sized>(
        &mut self,
        evaluator: &E,
        statement: &str,
    ) -> Result<Option<Value>, DeckError> {
        let mut session = Session::seed(self);
        let result = evaluator
            .interpret(statement, &mut session.globals, None)
            .map_err(|source| DeckError::Statement {
                statement: statement.to_string(),
                source,
            })?;
        *self = session.into_deck(self.syntax.clone());
        Ok(result)
    }

    // ── Cards ────────────────────────────────────────────────────

    /// Add (or overwrite) a card. Creates the suit if needed.
    pub fn add_card(&mut self, suit: &str, name: &str, value: impl Into<Value>) {
        self.copy_card(Card::new(suit, name, value));
    }

    pub fn add_card_commented(&mut self, suit: &str, name: &str, value: impl Into<Value>, comment: &str) {
        self.copy_card(Card::new(suit, name, value).with_comment(comment));
    }

    /// Insert a complete card under its own suit and name.
    pub fn copy_card(&mut self, card: Card) {
        self.register_suit(&card.suit);
        self.table
            .entry(card.suit.clone())
            .or_default()
            .insert(card.name.clone(), card);
    }

    pub fn get_card(&self, suit: &str, name: &str) -> Result<&Card, DeckError> {
        self.get_suit(suit)
            .ok_or_else(|| DeckError::suit_not_found(suit))?
            .get(name)
            .ok_or_else(|| DeckError::card_not_found(suit, name))
    }

    fn get_card_mut(&mut self, suit: &str, name: &str) -> Result<&mut Card, DeckError> {
        self.table
            .get_mut(suit)
            .ok_or_else(|| DeckError::suit_not_found(suit))?
            .get_mut(name)
            .ok_or_else(|| DeckError::card_not_found(suit, name))
    }

    pub fn get_card_value<T: FromValue>(&self, suit: &str, name: &str) -> Result<T, DeckError> {
        self.get_card(suit, name)?.get()
    }

    /// The card's value, or `default` after storing it as a new card.
    pub fn get_or_add_card_value<T>(&mut self, suit: &str, name: &str, default: T) -> Result<T, DeckError>
    where
        T: FromValue + Into<Value>,
    {
        self.get_or_add_card_value_commented(suit, name, default, "")
    }

    pub fn get_or_add_card_value_commented<T>(
        &mut self,
        suit: &str,
        name: &str,
        default: T,
        comment: &str,
    ) -> Result<T, DeckError>
    where
        T: FromValue + Into<Value>,
    {
        if let Ok(card) = self.get_card(suit, name) {
            return card.get();
        }
        let card = Card::new(suit, name, default).with_comment(comment);
        let value = card.get();
        self.copy_card(card);
        value
    }

    /// Replace a card's value, keeping its comment and line.
    pub fn update_card(&mut self, suit: &str, name: &str, value: impl Into<Value>) -> Result<(), DeckError> {
        self.get_card_mut(suit, name)?.set_value(value);
        Ok(())
    }

    pub fn update_card_with_comment(
        &mut self,
        suit: &str,
        name: &str,
        value: impl Into<Value>,
        comment: &str,
    ) -> Result<(), DeckError> {
        let card = self.get_card_mut(suit, name)?;
        card.set_value(value);
        card.set_comment(comment);
        Ok(())
    }

    /// Replace an existing card with `card`, line and comment included. The
    /// card must already exist under its suit and name.
    pub fn update_card_entry(&mut self, card: Card) -> Result<(), DeckError> {
        let slot = self.get_card_mut(&card.suit, &card.name)?;
        *slot = card;
        Ok(())
    }

    pub fn remove_card(&mut self, suit: &str, name: &str) -> Result<Card, DeckError> {
        self.table
            .get_mut(suit)
            .ok_or_else(|| DeckError::suit_not_found(suit))?
            .shift_remove(name)
            .ok_or_else(|| DeckError::card_not_found(suit, name))
    }

    // ── Suits and queries ────────────────────────────────────────

    /// Suit names in declaration order. The root suit is always first.
    pub fn suits(&self) -> &[String] {
        &self.suits
    }

    pub fn get_suit(&self, suit: &str) -> Option<&Suit> {
        self.table.get(suit)
    }

    /// Suits in declaration order with their cards. Suits declared without
    /// cards are skipped.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Suit)> {
        self.suits
            .iter()
            .filter_map(|name| self.table.get(name).map(|suit| (name.as_str(), suit)))
    }

    /// Number of declared suits, the root included.
    pub fn len(&self) -> usize {
        self.suits.len()
    }

    /// True when the deck holds no cards. The root suit is always declared,
    /// so this does not follow [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.card_count() == 0
    }

    pub fn card_count(&self) -> usize {
        self.table.values().map(IndexMap::len).sum()
    }

    pub fn find_suit(&self, suit: &str) -> Result<Vec<&Card>, DeckError> {
        self.get_suit(suit)
            .map(|cards| cards.values().collect())
            .ok_or_else(|| DeckError::suit_not_found(suit))
    }

    /// Cards of every suit whose name contains `pattern`. `*` is ignored, not
    /// a wildcard.
    pub fn find_suit_fuzzy(&self, pattern: &str) -> Vec<&Card> {
        let needle: String = pattern.chars().filter(|c| *c != '*').collect();
        let found: Vec<&Card> = self
            .iter()
            .filter(|(name, _)| name.contains(needle.as_str()))
            .flat_map(|(_, cards)| cards.values())
            .collect();
        if found.is_empty() {
            warn!(pattern = %needle, "no suits matching pattern found in the deck");
        }
        found
    }

    /// Like [`find_suit`](Self::find_suit) or
    /// [`find_suit_fuzzy`](Self::find_suit_fuzzy), sorted by source line.
    /// Cards without a line sort first. A missing root suit is empty, not an
    /// error.
    pub fn find_suit_in_order(&self, suit: &str, fuzzy: bool) -> Result<Vec<&Card>, DeckError> {
        let mut cards = if fuzzy {
            self.find_suit_fuzzy(suit)
        } else {
            match self.find_suit(suit) {
                Err(DeckError::SuitNotFound { .. }) if suit == ROOT_SUIT => Vec::new(),
                other => other?,
            }
        };
        cards.sort_by_key(|card| card.line);
        Ok(cards)
    }

    /// Cards in `suit` whose name contains `fragment`.
    pub fn find_card_fuzzy(&self, suit: &str, fragment: &str) -> Result<Vec<&Card>, DeckError> {
        let found: Vec<&Card> = self
            .find_suit(suit)?
            .into_iter()
            .filter(|card| card.name.contains(fragment))
            .collect();
        if found.is_empty() {
            warn!(suit, fragment, "no cards matching fragment found in suit");
        }
        Ok(found)
    }

    pub fn does_suit_exist(&self, suit: &str) -> bool {
        self.table.contains_key(suit)
    }

    pub fn does_card_exist(&self, suit: &str, name: &str) -> bool {
        self.get_suit(suit).is_some_and(|cards| cards.contains_key(name))
    }

    // ── Vectors ──────────────────────────────────────────────────

    /// Every card whose name contains `name[`, in definition order.
    pub fn get_vector<T: FromValue>(&self, suit: &str, name: &str) -> Result<Vec<T>, DeckError> {
        let stem = format!("{name}[");
        self.find_suit(suit)?
            .into_iter()
            .filter(|card| card.name.contains(&stem))
            .map(Card::get)
            .collect()
    }

    /// Add `name[0]`, `name[1]`, ... from `values`.
    pub fn add_vector<T: Into<Value>>(&mut self, suit: &str, name: &str, values: impl IntoIterator<Item = T>) {
        for (i, value) in values.into_iter().enumerate() {
            self.add_card(suit, &format!("{name}[{i}]"), value);
        }
    }

    /// Update `name[0]`, `name[1]`, ... from `values`. Elements past the end
    /// of `values` keep their value.
    pub fn update_vector<T: Into<Value>>(
        &mut self,
        suit: &str,
        name: &str,
        values: impl IntoIterator<Item = T>,
    ) -> Result<(), DeckError> {
        for (i, value) in values.into_iter().enumerate() {
            self.update_card(suit, &format!("{name}[{i}]"), value)?;
        }
        Ok(())
    }

    pub(crate) fn register_suit(&mut self, suit: &str) {
        if !self.suits.iter().any(|s| s == suit) {
            self.suits.push(suit.to_string());
        }
    }
}

impl fmt::Display for Deck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = Vec::new();
        self.write_deck(&mut out).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&out))
    }
}
