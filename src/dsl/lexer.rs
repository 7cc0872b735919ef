use super::ast::Span;
use super::error::EvalError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(f64),
    String(String),
    True,
    False,

    /// A possibly qualified, possibly indexed name: `a`, `suit.card`, `v[0]`.
    Name(String),

    // Punctuation
    LParen,
    RParen,
    Comma,

    // Operators
    Plus,
    Minus,
    Star,
    StarStar, // ** or ^
    Slash,
    Percent,
    Lt,
    Gt,
    Le,   // <=
    Ge,   // >=
    EqEq, // ==
    Ne,   // !=
    And,  // &&
    Or,   // ||
    Bang, // !
    Eq,   // =

    Eof,
}

#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

pub fn lex(source: &str) -> Result<Vec<SpannedToken>, EvalError> {
    let mut lexer = Lexer::new(source);
    lexer.tokenize()
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<SpannedToken>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn tokenize(&mut self) -> Result<Vec<SpannedToken>, EvalError> {
        loop {
            self.skip_whitespace();
            if self.pos >= self.bytes.len() {
                break;
            }

            let start = self.pos;
            let ch = self.bytes[self.pos];

            match ch {
                b'(' => self.single(Token::LParen),
                b')' => self.single(Token::RParen),
                b',' => self.single(Token::Comma),
                b'+' => self.single(Token::Plus),
                b'-' => self.single(Token::Minus),
                b'/' => self.single(Token::Slash),
                b'%' => self.single(Token::Percent),
                b'^' => self.single(Token::StarStar),
                b'*' => self.one_or_two(b'*', Token::Star, Token::StarStar),
                b'<' => self.one_or_two(b'=', Token::Lt, Token::Le),
                b'>' => self.one_or_two(b'=', Token::Gt, Token::Ge),
                b'=' => self.one_or_two(b'=', Token::Eq, Token::EqEq),
                b'!' => self.one_or_two(b'=', Token::Bang, Token::Ne),
                b'&' => self.pair(b'&', Token::And, "Expected '&&' for logical AND")?,
                b'|' => self.pair(b'|', Token::Or, "Expected '||' for logical OR")?,
                b'"' => {
                    self.pos += 1;
                    self.lex_string(start)?;
                }
                b'0'..=b'9' => self.lex_number(start)?,
                b'.' if self.bytes.get(self.pos + 1).is_some_and(u8::is_ascii_digit) => {
                    self.lex_number(start)?;
                }
                b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.lex_name(start),
                _ => {
                    let ch = self.source[start..].chars().next().unwrap_or('?');
                    return Err(EvalError::lexer(
                        format!("Unexpected character: '{ch}'"),
                        Span::new(start, start + ch.len_utf8()),
                    ));
                }
            }
        }

        self.tokens.push(SpannedToken {
            token: Token::Eof,
            span: Span::new(self.pos, self.pos),
        });
        Ok(std::mem::take(&mut self.tokens))
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn push(&mut self, token: Token, start: usize, end: usize) {
        self.tokens.push(SpannedToken {
            token,
            span: Span::new(start, end),
        });
    }

    fn single(&mut self, token: Token) {
        let start = self.pos;
        self.pos += 1;
        self.push(token, start, self.pos);
    }

    /// `one` alone, or `two` when the next byte is `second`.
    fn one_or_two(&mut self, second: u8, one: Token, two: Token) {
        let start = self.pos;
        if self.peek_at(1) == Some(second) {
            self.pos += 2;
            self.push(two, start, self.pos);
        } else {
            self.pos += 1;
            self.push(one, start, self.pos);
        }
    }

    /// A doubled operator with no single-character form (`&&`, `||`).
    fn pair(&mut self, second: u8, token: Token, message: &str) -> Result<(), EvalError> {
        let start = self.pos;
        if self.peek_at(1) == Some(second) {
            self.pos += 2;
            self.push(token, start, self.pos);
            Ok(())
        } else {
            Err(EvalError::lexer(message, Span::new(start, start + 1)))
        }
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn lex_string(&mut self, start: usize) -> Result<(), EvalError> {
        let str_start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'"' {
            self.pos += 1;
        }
        if self.pos >= self.bytes.len() {
            return Err(EvalError::lexer("Unterminated string literal", Span::new(start, self.pos)));
        }
        let s = self.source[str_start..self.pos].to_string();
        self.pos += 1;
        self.push(Token::String(s), start, self.pos);
        Ok(())
    }

    fn eat_digits(&mut self) -> usize {
        let from = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        self.pos - from
    }

    fn lex_number(&mut self, start: usize) -> Result<(), EvalError> {
        self.eat_digits();
        if self.peek_at(0) == Some(b'.') {
            self.pos += 1;
            self.eat_digits();
        }
        // Exponent only when it is complete: `3e8`, `1.5E-3`. A bare `e`
        // after a number is left for the next token.
        if matches!(self.peek_at(0), Some(b'e' | b'E')) {
            let digits_at = if matches!(self.peek_at(1), Some(b'+' | b'-')) { 2 } else { 1 };
            if self.peek_at(digits_at).is_some_and(|b| b.is_ascii_digit()) {
                self.pos += digits_at;
                self.eat_digits();
            }
        }
        let text = &self.source[start..self.pos];
        match text.parse::<f64>() {
            Ok(v) => {
                self.push(Token::Number(v), start, self.pos);
                Ok(())
            }
            Err(_) => Err(EvalError::lexer(format!("Invalid number: {text}"), Span::new(start, self.pos))),
        }
    }

    /// Names fold `.segment` and `[digits]` suffixes into one identifier, so
    /// `suit.card[2]` is a single symbol-table key.
    fn lex_name(&mut self, start: usize) {
        loop {
            while self.pos < self.bytes.len()
                && (self.bytes[self.pos].is_ascii_alphanumeric() || self.bytes[self.pos] == b'_')
            {
                self.pos += 1;
            }
            match self.peek_at(0) {
                Some(b'.') if self.peek_at(1).is_some_and(|b| b.is_ascii_alphabetic() || b == b'_') => {
                    self.pos += 1;
                }
                Some(b'[') => {
                    let mut end = self.pos + 1;
                    while self.bytes.get(end).is_some_and(u8::is_ascii_digit) {
                        end += 1;
                    }
                    if end > self.pos + 1 && self.bytes.get(end) == Some(&b']') {
                        self.pos = end + 1;
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        let word = &self.source[start..self.pos];
        let token = match word {
            "true" => Token::True,
            "false" => Token::False,
            _ => Token::Name(word.to_string()),
        };
        self.push(token, start, self.pos);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tok(s: &str) -> Vec<Token> {
        lex(s).unwrap().into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn simple_tokens() {
        let tokens = tok("1 + 2.5");
        assert_eq!(tokens, vec![Token::Number(1.0), Token::Plus, Token::Number(2.5), Token::Eof]);
    }

    #[test]
    fn exponent_numbers() {
        assert_eq!(tok("3e8"), vec![Token::Number(3e8), Token::Eof]);
        assert_eq!(tok("1.380649e-23"), vec![Token::Number(1.380649e-23), Token::Eof]);
        assert_eq!(tok("1.10000000000000009e+00"), vec![Token::Number(1.1), Token::Eof]);
        assert_eq!(tok(".5"), vec![Token::Number(0.5), Token::Eof]);
    }

    #[test]
    fn operators() {
        let tokens = tok("+ - * / % ** ^ < > <= >= == != && || ! =");
        assert_eq!(tokens, vec![
            Token::Plus, Token::Minus, Token::Star, Token::Slash, Token::Percent,
            Token::StarStar, Token::StarStar, Token::Lt, Token::Gt, Token::Le, Token::Ge,
            Token::EqEq, Token::Ne, Token::And, Token::Or, Token::Bang, Token::Eq, Token::Eof,
        ]);
    }

    #[test]
    fn qualified_and_indexed_names() {
        let tokens = tok("suit1.card1 + v[0] - a.b.w[12]");
        assert_eq!(tokens, vec![
            Token::Name("suit1.card1".into()), Token::Plus,
            Token::Name("v[0]".into()), Token::Minus,
            Token::Name("a.b.w[12]".into()), Token::Eof,
        ]);
    }

    #[test]
    fn assignment_target() {
        let tokens = tok("s.v[1]=\"hi there\"");
        assert_eq!(tokens, vec![
            Token::Name("s.v[1]".into()), Token::Eq, Token::String("hi there".into()), Token::Eof,
        ]);
    }

    #[test]
    fn keywords() {
        assert_eq!(tok("true false truth"), vec![
            Token::True, Token::False, Token::Name("truth".into()), Token::Eof,
        ]);
    }

    #[test]
    fn errors() {
        assert!(lex("\"open").is_err());
        assert!(lex("a & b").is_err());
        assert!(lex("a $ b").is_err());
        assert!(lex("v[x]").is_err());
    }
}
