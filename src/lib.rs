//! Compiler and queryable store for card/suit configuration decks.
//!
//! ```text
//! g = 10            # root card
//! <physics>
//! mass = 2
//! energy = mass * g ** 2
//! v = [1, 2, 3]
//! ```

pub mod compiler;
pub mod dsl;
pub mod error;
pub mod model;
pub mod settings;
pub mod util;

pub use dsl::{Evaluator, Interpreter, SymbolTable};
pub use error::{DeckError, ErrorKind};
pub use model::{Card, Deck, FromValue, Suit, Value};
pub use settings::{Syntax, ROOT_SUIT};
