//! Deck source compiler.
//!
//! raw line → [`normalize`] → header ([`suit`]) or assignment ([`classify`])
//! → scalar bindings → evaluator → [`Session`]

pub mod classify;
pub mod normalize;
pub mod scanner;
pub mod suit;

use std::io::BufRead;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::dsl::{Evaluator, SymbolTable};
use crate::error::DeckError;
use crate::model::{Card, Deck};
use crate::settings::Syntax;
use classify::{classify, Binding, Form};
use normalize::LineState;
use suit::{parse_header, qualify, unqualify, SuitState};

/// Where a card was declared and what was said about it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Meta {
    pub line: Option<usize>,
    pub comment: String,
}

/// Everything one build accumulates before it is folded into a deck.
///
/// Seeded from the deck being built on, so new text can read and override
/// existing cards by their qualified names.
#[derive(Debug, Default)]
pub struct Session {
    pub globals: SymbolTable,
    pub meta: IndexMap<String, Meta>,
    pub suits: Vec<String>,
}

impl Session {
    pub fn seed(deck: &Deck) -> Self {
        let mut session = Session {
            suits: deck.suits().to_vec(),
            ..Session::default()
        };
        for (suit, cards) in deck.iter() {
            for card in cards.values() {
                let qualified = qualify(suit, &card.name);
                session.globals.insert(qualified.clone(), card.value().clone());
                session.meta.insert(
                    qualified,
                    Meta {
                        line: card.line,
                        comment: card.comment().to_string(),
                    },
                );
            }
        }
        session
    }

    /// Rebuild a deck from the symbol table. Globals under a suit nobody
    /// declared get that suit appended to the order.
    pub fn into_deck(self, syntax: Syntax) -> Deck {
        let Session { globals, mut meta, suits } = self;
        let mut deck = Deck::with_syntax(syntax);
        for suit in &suits {
            deck.register_suit(suit);
        }
        for (qualified, value) in globals {
            let (suit, name) = unqualify(&qualified);
            let Meta { line, comment } = meta.swap_remove(&qualified).unwrap_or_default();
            deck.copy_card(Card::new(suit, name, value).with_line(line).with_comment(comment));
        }
        deck
    }
}

/// Per-input state, dropped when the input ends.
#[derive(Debug, Default)]
pub struct CompileState {
    pub suit: SuitState,
    pub lines: LineState,
    /// Cards of the current suit by their short names.
    pub locals: SymbolTable,
}

/// Compile one input stream into `session`. Lines are numbered from 0 per
/// stream.
pub fn compile<E, R>(evaluator: &E, syntax: &Syntax, session: &mut Session, reader: R) -> Result<(), DeckError>
where
    E: Evaluator + ?Sized,
    R: BufRead,
{
    let mut compiler = Compiler {
        evaluator,
        syntax,
        session,
        state: CompileState::default(),
    };

    let mut last = 0;
    for (n, raw) in reader.lines().enumerate() {
        let raw = raw?;
        last = n;
        if let Some(text) = compiler.state.lines.push(&raw, syntax) {
            compiler.logical_line(&text, n)?;
        }
    }
    if let Some(text) = compiler.state.lines.finish() {
        warn!(line = last, "input ended inside a continuation, compiling '{text}'");
        compiler.logical_line(&text, last)?;
    }
    Ok(())
}

struct Compiler<'a, E: ?Sized> {
    evaluator: &'a E,
    syntax: &'a Syntax,
    session: &'a mut Session,
    state: CompileState,
}

impl<E: Evaluator + ?Sized> Compiler<'_, E> {
    fn logical_line(&mut self, text: &str, line: usize) -> Result<(), DeckError> {
        if let Some(name) = parse_header(text, self.syntax, line)? {
            let suit = self.state.suit.enter(&name, line)?.to_string();
            self.state.locals.clear();
            debug!(suit = %suit, line, "entering suit");
            if !self.session.suits.contains(&suit) {
                self.session.suits.push(suit);
            }
            return Ok(());
        }

        match classify(text, line)? {
            Form::Bare(statement) => {
                self.evaluator
                    .interpret(&statement, &mut self.session.globals, Some(&self.state.locals))
                    .map_err(|source| DeckError::BareStatement { statement, line, source })?;
            }
            form => {
                for binding in form.bindings(line)? {
                    self.bind(binding, line)?;
                }
            }
        }
        Ok(())
    }

    fn bind(&mut self, binding: Binding, line: usize) -> Result<(), DeckError> {
        let qualified = qualify(self.state.suit.current(), &binding.local);
        let statement = format!("{qualified} = {}", binding.rhs);
        self.evaluator
            .interpret(&statement, &mut self.session.globals, Some(&self.state.locals))
            .map_err(|source| DeckError::Eval {
                statement: statement.clone(),
                line,
                source,
            })?;
        let value = self
            .session
            .globals
            .get(&qualified)
            .cloned()
            .ok_or_else(|| DeckError::card(line, format!("'{statement}' did not define '{qualified}'")))?;

        debug!(card = %qualified, line, value = %value, "bound card");
        self.session.meta.insert(
            qualified,
            Meta {
                line: Some(line),
                comment: self.state.lines.take_comment(),
            },
        );
        self.state.locals.insert(binding.local, value);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::dsl::error::EvalError;
    use crate::dsl::Interpreter;
    use crate::error::ErrorKind;
    use crate::model::Value;

    fn run(source: &str) -> Result<Session, DeckError> {
        let mut session = Session::seed(&Deck::new());
        compile(&Interpreter, &Syntax::default(), &mut session, source.as_bytes())?;
        Ok(session)
    }

    #[test]
    fn qualified_globals_and_lines() {
        let session = run("g = 1\n\n<s>\n# comment\nx = g + 1 # two\n").unwrap();
        assert_eq!(session.globals.get("s.x"), Some(&Value::Number(2.0)));
        assert_eq!(session.meta.get("s.x").unwrap(), &Meta { line: Some(4), comment: "two".into() });
        assert_eq!(session.suits, vec!["/".to_string(), "s".to_string()]);
    }

    #[test]
    fn locals_do_not_cross_suits() {
        let err = run("<a>\nx = 1\n<b>\ny = x\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Evaluator);
        assert_eq!(err.line(), Some(3));
        assert!(err.to_string().contains("b.y = x"));

        let session = run("<a>\nx = 1\n<b>\ny = a.x\n").unwrap();
        assert_eq!(session.globals.get("b.y"), Some(&Value::Number(1.0)));
    }

    #[test]
    fn continuation_line_is_where_it_ends() {
        let session = run("a = 1 + &\n 2 + &\n 3\n").unwrap();
        assert_eq!(session.globals.get("a"), Some(&Value::Number(6.0)));
        assert_eq!(session.meta.get("a").unwrap().line, Some(2));
    }

    #[test]
    fn dangling_continuation_is_flushed() {
        let session = run("a = 1 + &\n 2 &\n").unwrap();
        assert_eq!(session.globals.get("a"), Some(&Value::Number(3.0)));
    }

    #[test]
    fn only_first_vector_element_gets_the_comment() {
        let session = run("v = [1, 2] # note\n").unwrap();
        assert_eq!(session.meta.get("v[0]").unwrap().comment, "note");
        assert_eq!(session.meta.get("v[1]").unwrap().comment, "");
    }

    #[test]
    fn bare_statement_failure_hints_at_missing_eq() {
        let err = run("x 1\n").unwrap_err();
        assert!(matches!(err, DeckError::BareStatement { line: 0, .. }));
        assert!(err.to_string().contains("missing '='"));
        assert!(run("print(1)\n").is_ok());
    }

    #[test]
    fn repeated_header_registers_once() {
        let session = run("<s>\na = 1\n<t>\n<s>\nb = 2\n").unwrap();
        assert_eq!(session.suits, vec!["/".to_string(), "s".to_string(), "t".to_string()]);
    }

    /// Records every statement and defines its target as 0.
    #[derive(Default)]
    struct Recorder(RefCell<Vec<String>>);

    impl Evaluator for Recorder {
        fn interpret(
            &self,
            statement: &str,
            globals: &mut SymbolTable,
            _locals: Option<&SymbolTable>,
        ) -> Result<Option<Value>, EvalError> {
            self.0.borrow_mut().push(statement.to_string());
            if let Some((name, _)) = statement.split_once(" = ") {
                globals.insert(name.to_string(), Value::Number(0.0));
            }
            Ok(None)
        }
    }

    #[test]
    fn statements_reach_the_evaluator_as_bindings() {
        let recorder = Recorder::default();
        let mut session = Session::default();
        let source = "v = [5]\n<s>\nw = [1, 2]\nx[:2] = w[:2]\n";
        compile(&recorder, &Syntax::default(), &mut session, source.as_bytes()).unwrap();
        assert_eq!(
            *recorder.0.borrow(),
            ["v = [5]", "s.w[0] = 1", "s.w[1] = 2", "s.x[0] = w[0]", "s.x[1] = w[1]"]
        );
    }

    #[test]
    fn into_deck_restores_suits() {
        let deck = run("<a/b>\nx = 1\n").unwrap().into_deck(Syntax::default());
        assert_eq!(deck.get_card_value::<f64>("a/b", "x").unwrap(), 1.0);
    }
}
