use super::ast::*;
use super::error::EvalError;
use super::lexer::{SpannedToken, Token};

/// Parse one statement: `name = expr` or a bare expression.
pub fn parse(tokens: Vec<SpannedToken>) -> Result<Stmt, EvalError> {
    let mut parser = Parser::new(tokens);
    parser.parse_stmt()
}

/// Deepest nesting of parentheses and prefix operators a statement may use.
const MAX_NESTING: usize = 128;

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    depth: usize,
}

fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr {
        kind: ExprKind::BinOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    }
}

impl Parser {
    fn new(tokens: Vec<SpannedToken>) -> Self {
        Self { tokens, pos: 0, depth: 0 }
    }

    // ── Helpers ────────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).map_or(&Token::Eof, |t| &t.token)
    }

    fn peek_next(&self) -> &Token {
        self.tokens.get(self.pos + 1).map_or(&Token::Eof, |t| &t.token)
    }

    fn span(&self) -> Span {
        self.tokens.get(self.pos).map_or(Span::new(0, 0), |t| t.span)
    }

    fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<Span, EvalError> {
        if self.peek() == expected {
            let sp = self.span();
            self.advance();
            Ok(sp)
        } else {
            Err(EvalError::parser(
                format!("Expected {expected:?}, got {:?}", self.peek()),
                self.span(),
            ))
        }
    }

    fn nest(&mut self) -> Result<(), EvalError> {
        if self.depth >= MAX_NESTING {
            return Err(EvalError::parser(
                format!("Expression nested deeper than {MAX_NESTING} levels"),
                self.span(),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn expect_eof(&self) -> Result<(), EvalError> {
        if matches!(self.peek(), Token::Eof) {
            Ok(())
        } else {
            Err(EvalError::parser(
                format!("Unexpected token after expression: {:?}", self.peek()),
                self.span(),
            ))
        }
    }

    // ── Statements ────────────────────────────────────────────────

    fn parse_stmt(&mut self) -> Result<Stmt, EvalError> {
        let target = match (self.peek(), self.peek_next()) {
            (Token::Name(name), Token::Eq) => Some(name.clone()),
            _ => None,
        };
        if let Some(name) = target {
            self.advance();
            self.advance();
            let value = self.parse_expr()?;
            self.expect_eof()?;
            return Ok(Stmt::Assign { name, value });
        }
        let expr = self.parse_expr()?;
        self.expect_eof()?;
        Ok(Stmt::Expr(expr))
    }

    // ── Expression parsing (precedence climbing) ──────────────────

    fn parse_expr(&mut self) -> Result<Expr, EvalError> {
        self.nest()?;
        let expr = self.parse_or();
        self.depth -= 1;
        expr
    }

    fn parse_or(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_and()?;
        while matches!(self.peek(), Token::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = binary(BinOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_equality()?;
        while matches!(self.peek(), Token::And) {
            self.advance();
            let right = self.parse_equality()?;
            left = binary(BinOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek() {
                Token::EqEq => BinOp::Eq,
                Token::Ne => BinOp::Ne,
                _ => break,
            };
            self.advance();
            let right = self.parse_comparison()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_add()?;
        loop {
            let op = match self.peek() {
                Token::Lt => BinOp::Lt,
                Token::Gt => BinOp::Gt,
                Token::Le => BinOp::Le,
                Token::Ge => BinOp::Ge,
                _ => break,
            };
            self.advance();
            let right = self.parse_add()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_add(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_mul()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_mul()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_mul(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                Token::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    /// Unary binds looser than `**`, so `-2 ** 2` is `-(2 ** 2)`.
    fn parse_unary(&mut self) -> Result<Expr, EvalError> {
        let op = match self.peek() {
            Token::Minus => UnaryOp::Neg,
            Token::Bang => UnaryOp::Not,
            _ => return self.parse_power(),
        };
        let start = self.span();
        self.advance();
        self.nest()?;
        let operand = self.parse_unary();
        self.depth -= 1;
        let operand = operand?;
        let span = start.merge(operand.span);
        Ok(Expr {
            kind: ExprKind::UnaryOp {
                op,
                operand: Box::new(operand),
            },
            span,
        })
    }

    /// Power operator `**` / `^`, right-associative.
    fn parse_power(&mut self) -> Result<Expr, EvalError> {
        let left = self.parse_postfix()?;
        if matches!(self.peek(), Token::StarStar) {
            self.advance();
            // Exponent may itself be negated: 2 ** -1
            self.nest()?;
            let right = self.parse_unary();
            self.depth -= 1;
            let right = right?;
            Ok(binary(BinOp::Pow, left, right))
        } else {
            Ok(left)
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, EvalError> {
        let expr = self.parse_primary()?;
        if let (ExprKind::Name(name), Token::LParen) = (&expr.kind, self.peek()) {
            let name = name.clone();
            self.advance();
            let args = self.parse_args()?;
            let end = self.tokens.get(self.pos.saturating_sub(1)).map_or(expr.span, |t| t.span);
            return Ok(Expr {
                kind: ExprKind::Call { name, args },
                span: expr.span.merge(end),
            });
        }
        Ok(expr)
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, EvalError> {
        let mut args = Vec::new();
        if !matches!(self.peek(), Token::RParen) {
            args.push(self.parse_expr()?);
            while matches!(self.peek(), Token::Comma) {
                self.advance();
                args.push(self.parse_expr()?);
            }
        }
        self.expect(&Token::RParen)?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        let span = self.span();
        match self.peek().clone() {
            Token::Number(v) => {
                self.advance();
                Ok(Expr { kind: ExprKind::Number(v), span })
            }
            Token::String(s) => {
                self.advance();
                Ok(Expr { kind: ExprKind::Str(s), span })
            }
            Token::True => {
                self.advance();
                Ok(Expr { kind: ExprKind::Bool(true), span })
            }
            Token::False => {
                self.advance();
                Ok(Expr { kind: ExprKind::Bool(false), span })
            }
            Token::Name(name) => {
                self.advance();
                Ok(Expr { kind: ExprKind::Name(name), span })
            }
            Token::LParen => {
                self.advance();
                let mut expr = self.parse_expr()?;
                let end = self.expect(&Token::RParen)?;
                expr.span = span.merge(end);
                Ok(expr)
            }
            Token::Eof => Err(EvalError::parser("Unexpected end of expression", span)),
            other => Err(EvalError::parser(format!("Unexpected token: {other:?}"), span)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::dsl::lexer::lex;

    fn parse_str(s: &str) -> Stmt {
        parse(lex(s).unwrap()).unwrap()
    }

    fn parse_expr(s: &str) -> Expr {
        match parse_str(s) {
            Stmt::Expr(e) => e,
            Stmt::Assign { .. } => panic!("expected expression"),
        }
    }

    #[test]
    fn parse_assignment() {
        match parse_str("suit1.card1 = 3 + 4") {
            Stmt::Assign { name, value } => {
                assert_eq!(name, "suit1.card1");
                assert!(matches!(value.kind, ExprKind::BinOp { op: BinOp::Add, .. }));
            }
            Stmt::Expr(_) => panic!("expected assignment"),
        }
    }

    #[test]
    fn comparison_is_not_assignment() {
        let expr = parse_expr("a == 3");
        assert!(matches!(expr.kind, ExprKind::BinOp { op: BinOp::Eq, .. }));
    }

    #[test]
    fn precedence_mul_over_add() {
        let expr = parse_expr("1 + 2 * 3");
        let ExprKind::BinOp { op, right, .. } = expr.kind else { panic!() };
        assert_eq!(op, BinOp::Add);
        assert!(matches!(right.kind, ExprKind::BinOp { op: BinOp::Mul, .. }));
    }

    #[test]
    fn power_is_right_associative() {
        let expr = parse_expr("2 ** 3 ^ 2");
        let ExprKind::BinOp { op, left, right } = expr.kind else { panic!() };
        assert_eq!(op, BinOp::Pow);
        assert!(matches!(left.kind, ExprKind::Number(_)));
        assert!(matches!(right.kind, ExprKind::BinOp { op: BinOp::Pow, .. }));
    }

    #[test]
    fn negation_wraps_power() {
        let expr = parse_expr("-2 ** 2");
        let ExprKind::UnaryOp { op, operand } = expr.kind else { panic!() };
        assert_eq!(op, UnaryOp::Neg);
        assert!(matches!(operand.kind, ExprKind::BinOp { op: BinOp::Pow, .. }));
    }

    #[test]
    fn function_call() {
        let expr = parse_expr("max(a, b + 1)");
        let ExprKind::Call { name, args } = expr.kind else { panic!() };
        assert_eq!(name, "max");
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn logic_precedence() {
        let expr = parse_expr("a < 1 || b && c");
        let ExprKind::BinOp { op, right, .. } = expr.kind else { panic!() };
        assert_eq!(op, BinOp::Or);
        assert!(matches!(right.kind, ExprKind::BinOp { op: BinOp::And, .. }));
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        assert!(parse(lex("1 2").unwrap()).is_err());
        assert!(parse(lex("a = ").unwrap()).is_err());
        assert!(parse(lex("(1 + 2").unwrap()).is_err());
        assert!(parse(lex("3 = a").unwrap()).is_err());
    }

    #[test]
    fn deep_nesting_is_an_error_not_an_overflow() {
        let parens = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
        let err = parse(lex(&parens).unwrap()).unwrap_err();
        assert_eq!(err.kind, crate::dsl::error::EvalErrorKind::Parser);

        let negations = format!("{}1", "-".repeat(10_000));
        assert!(parse(lex(&negations).unwrap()).is_err());

        let powers = vec!["2"; 10_000].join(" ** ");
        assert!(parse(lex(&powers).unwrap()).is_err());

        let shallow = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        assert!(parse(lex(&shallow).unwrap()).is_ok());
    }
}
