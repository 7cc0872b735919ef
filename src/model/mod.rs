pub mod card;
pub mod deck;
pub mod value;
mod writer;

// Re-export commonly used types at the model level.
pub use card::Card;
pub use deck::{Deck, Suit};
pub use value::{FromValue, Value};
