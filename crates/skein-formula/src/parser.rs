//! Recursive-descent parser over the token stream, one function per
//! precedence level:
//!
//! ```text
//! expr     := logical
//! logical  := equality  (('&&'|'||') equality)*
//! equality := relation  (('=='|'!=') relation)*
//! relation := addsub    (('<'|'>'|'<='|'>=') addsub)*
//! addsub   := muldiv    (('+'|'-') muldiv)*
//! muldiv   := expon     (('*'|'/'|'%') expon)*
//! expon    := unary     ('^' unary)*
//! unary    := ('-'|'!')? primary
//! primary  := number | qstring | ident | ident '(' args? ')' | '(' expr ')'
//! ```

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::ParseError;
use crate::lexer::{lex, SpannedToken, Token};

/// Parse formula source text into an expression tree.
pub fn parse(src: &str) -> Result<Expr, ParseError> {
    let tokens = lex(src)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        src_len: src.len(),
    };
    let expr = parser.expression()?;
    if let Some(token) = parser.tokens.get(parser.pos) {
        return Err(ParseError::TrailingInput {
            offset: token.span.start,
        });
    }
    Ok(expr)
}

struct Parser<'a> {
    tokens: &'a [SpannedToken],
    pos: usize,
    src_len: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn advance(&mut self) -> Option<SpannedToken> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|t| t.span.start)
            .unwrap_or(self.src_len)
    }

    /// Consume one of the table's operator tokens if it is next.
    fn match_binary(&mut self, table: &[(Token, BinaryOp)]) -> Option<BinaryOp> {
        let next = self.peek()?;
        let op = table
            .iter()
            .find(|(token, _)| token == next)
            .map(|(_, op)| *op)?;
        self.pos += 1;
        Some(op)
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        match self.peek() {
            Some(token) if *token == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(token) => Err(ParseError::UnexpectedToken {
                found: format!("{token:?}"),
                offset: self.offset(),
            }),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.logical()
    }

    fn logical(&mut self) -> Result<Expr, ParseError> {
        const OPS: &[(Token, BinaryOp)] = &[
            (Token::AndAnd, BinaryOp::And),
            (Token::OrOr, BinaryOp::Or),
        ];
        let mut node = self.equality()?;
        while let Some(op) = self.match_binary(OPS) {
            let rhs = self.equality()?;
            node = Expr::Binary {
                op,
                lhs: Box::new(node),
                rhs: Box::new(rhs),
            };
        }
        Ok(node)
    }

    fn equality(&mut self) -> Result<Expr, ParseError> {
        const OPS: &[(Token, BinaryOp)] = &[
            (Token::EqEq, BinaryOp::Equal),
            (Token::NotEq, BinaryOp::NotEqual),
        ];
        let mut node = self.relation()?;
        while let Some(op) = self.match_binary(OPS) {
            let rhs = self.relation()?;
            node = Expr::Binary {
                op,
                lhs: Box::new(node),
                rhs: Box::new(rhs),
            };
        }
        Ok(node)
    }

    fn relation(&mut self) -> Result<Expr, ParseError> {
        const OPS: &[(Token, BinaryOp)] = &[
            (Token::Le, BinaryOp::LessOrEqual),
            (Token::Ge, BinaryOp::GreaterOrEqual),
            (Token::Lt, BinaryOp::LessThan),
            (Token::Gt, BinaryOp::GreaterThan),
        ];
        let mut node = self.addsub()?;
        while let Some(op) = self.match_binary(OPS) {
            let rhs = self.addsub()?;
            node = Expr::Binary {
                op,
                lhs: Box::new(node),
                rhs: Box::new(rhs),
            };
        }
        Ok(node)
    }

    fn addsub(&mut self) -> Result<Expr, ParseError> {
        const OPS: &[(Token, BinaryOp)] = &[
            (Token::Plus, BinaryOp::Add),
            (Token::Minus, BinaryOp::Subtract),
        ];
        let mut node = self.muldiv()?;
        while let Some(op) = self.match_binary(OPS) {
            let rhs = self.muldiv()?;
            node = Expr::Binary {
                op,
                lhs: Box::new(node),
                rhs: Box::new(rhs),
            };
        }
        Ok(node)
    }

    fn muldiv(&mut self) -> Result<Expr, ParseError> {
        const OPS: &[(Token, BinaryOp)] = &[
            (Token::Star, BinaryOp::Multiply),
            (Token::Slash, BinaryOp::Divide),
            (Token::Percent, BinaryOp::Remainder),
        ];
        let mut node = self.expon()?;
        while let Some(op) = self.match_binary(OPS) {
            let rhs = self.expon()?;
            node = Expr::Binary {
                op,
                lhs: Box::new(node),
                rhs: Box::new(rhs),
            };
        }
        Ok(node)
    }

    fn expon(&mut self) -> Result<Expr, ParseError> {
        const OPS: &[(Token, BinaryOp)] = &[(Token::Caret, BinaryOp::Power)];
        let mut node = self.unary()?;
        while let Some(op) = self.match_binary(OPS) {
            let rhs = self.unary()?;
            node = Expr::Binary {
                op,
                lhs: Box::new(node),
                rhs: Box::new(rhs),
            };
        }
        Ok(node)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek() {
            Some(Token::Minus) => Some(UnaryOp::Minus),
            Some(Token::Bang) => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            let operand = self.primary()?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let offset = self.offset();
        match self.advance() {
            Some(SpannedToken {
                token: Token::Number(text),
                ..
            }) => Ok(Expr::Number(text)),
            Some(SpannedToken {
                token: Token::QuotedString(text),
                ..
            }) => Ok(Expr::Str(text)),
            Some(SpannedToken {
                token: Token::Ident(name),
                ..
            }) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    let args = self.arguments()?;
                    Ok(Expr::Call { name, args })
                } else {
                    Ok(Expr::Variable(name))
                }
            }
            Some(SpannedToken {
                token: Token::LParen,
                ..
            }) => {
                let inner = self.expression()?;
                self.expect(Token::RParen)?;
                Ok(Expr::Paren(Box::new(inner)))
            }
            Some(SpannedToken { token, .. }) => Err(ParseError::UnexpectedToken {
                found: format!("{token:?}"),
                offset,
            }),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    /// Arguments after an already-consumed `(`. An empty list parses; its
    /// legality is the called function's semantic decision.
    fn arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
            return Ok(Vec::new());
        }
        let mut args = vec![self.expression()?];
        while self.peek() == Some(&Token::Comma) {
            self.pos += 1;
            args.push(self.expression()?);
        }
        self.expect(Token::RParen)?;
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(src: &str) -> String {
        parse(src).unwrap().to_string()
    }

    #[test]
    fn precedence_nests_as_expected() {
        let expr = parse("a+b*c").unwrap();
        match expr {
            Expr::Binary {
                op: BinaryOp::Add,
                rhs,
                ..
            } => assert!(matches!(
                *rhs,
                Expr::Binary {
                    op: BinaryOp::Multiply,
                    ..
                }
            )),
            other => panic!("expected addition at the root, got {other:?}"),
        }
    }

    #[test]
    fn parens_override_precedence() {
        let expr = parse("(a+b)*c").unwrap();
        match expr {
            Expr::Binary {
                op: BinaryOp::Multiply,
                lhs,
                ..
            } => assert!(matches!(*lhs, Expr::Paren(_))),
            other => panic!("expected multiplication at the root, got {other:?}"),
        }
    }

    #[test]
    fn canonical_text_drops_whitespace_only() {
        assert_eq!(canonical("a + 2"), "a+2");
        assert_eq!(canonical("max( a,  b )"), "max(a,b)");
        assert_eq!(canonical("( a + b ) * c"), "(a+b)*c");
        assert_eq!(canonical("-4.50"), "-4.50");
    }

    #[test]
    fn canonicalization_is_idempotent() {
        for src in [
            "a+b*c-2",
            "(a+b)*(c-d)",
            "-x^2",
            "if(a<b,a,b)",
            "x>=3&&y!=\"off\"",
            "abs(-4.5)%3",
        ] {
            let once = canonical(src);
            assert_eq!(canonical(&once), once, "not idempotent for {src}");
        }
    }

    #[test]
    fn binary_operators_are_left_associative() {
        let expr = parse("a-b-c").unwrap();
        assert_eq!(expr.to_string(), "a-b-c");
        match expr {
            Expr::Binary {
                op: BinaryOp::Subtract,
                lhs,
                ..
            } => assert!(matches!(
                *lhs,
                Expr::Binary {
                    op: BinaryOp::Subtract,
                    ..
                }
            )),
            other => panic!("expected left-nested subtraction, got {other:?}"),
        }
    }

    #[test]
    fn empty_argument_lists_parse() {
        assert_eq!(canonical("arg()"), "arg()");
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(parse("a+"), Err(ParseError::UnexpectedEnd)));
        assert!(matches!(
            parse("(a+b"),
            Err(ParseError::UnexpectedEnd)
        ));
        assert!(matches!(
            parse("a b"),
            Err(ParseError::TrailingInput { .. })
        ));
        assert!(matches!(
            parse("*a"),
            Err(ParseError::UnexpectedToken { .. })
        ));
    }
}
