//! Token definitions and the lexing entry point.

use crate::error::ParseError;
use logos::Logos;
use std::ops::Range;

/// Tokens of the formula surface syntax.
#[derive(Logos, Clone, Debug, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    /// An unsigned number literal; the original spelling is preserved.
    #[regex(r"[0-9]+(\.[0-9]+)?", |lex| lex.slice().to_string())]
    Number(String),

    /// A double-quoted string with the quotes stripped.
    #[regex(r#""[^"]*""#, |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    QuotedString(String),

    /// A variable or function name.
    #[regex(r"[A-Za-z][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    /// `+`
    #[token("+")]
    Plus,
    /// `-`
    #[token("-")]
    Minus,
    /// `*`
    #[token("*")]
    Star,
    /// `/`
    #[token("/")]
    Slash,
    /// `%`
    #[token("%")]
    Percent,
    /// `^`
    #[token("^")]
    Caret,
    /// `<=`
    #[token("<=")]
    Le,
    /// `>=`
    #[token(">=")]
    Ge,
    /// `<`
    #[token("<")]
    Lt,
    /// `>`
    #[token(">")]
    Gt,
    /// `==`
    #[token("==")]
    EqEq,
    /// `!=`
    #[token("!=")]
    NotEq,
    /// `&&`
    #[token("&&")]
    AndAnd,
    /// `||`
    #[token("||")]
    OrOr,
    /// `!`
    #[token("!")]
    Bang,
    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
    /// `,`
    #[token(",")]
    Comma,
}

/// A token paired with its byte span in the source text.
#[derive(Clone, Debug, PartialEq)]
pub struct SpannedToken {
    /// The token.
    pub token: Token,
    /// Byte span of the token in the source.
    pub span: Range<usize>,
}

/// Lex formula source into a token list.
pub fn lex(src: &str) -> Result<Vec<SpannedToken>, ParseError> {
    let mut lexer = Token::lexer(src);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push(SpannedToken {
                token,
                span: lexer.span(),
            }),
            Err(()) => {
                return Err(ParseError::UnexpectedCharacter {
                    offset: lexer.span().start,
                })
            }
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Token> {
        lex(src).unwrap().into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn lexes_literals_and_identifiers() {
        assert_eq!(
            kinds(r#"3 4.5 hp "two words""#),
            vec![
                Token::Number("3".into()),
                Token::Number("4.5".into()),
                Token::Ident("hp".into()),
                Token::QuotedString("two words".into()),
            ]
        );
    }

    #[test]
    fn two_character_operators_win_over_prefixes() {
        assert_eq!(
            kinds("<= >= == != && || < !"),
            vec![
                Token::Le,
                Token::Ge,
                Token::EqEq,
                Token::NotEq,
                Token::AndAnd,
                Token::OrOr,
                Token::Lt,
                Token::Bang,
            ]
        );
    }

    #[test]
    fn number_spelling_is_preserved() {
        assert_eq!(kinds("3.10"), vec![Token::Number("3.10".into())]);
    }

    #[test]
    fn rejects_stray_characters() {
        assert!(matches!(
            lex("a + $"),
            Err(ParseError::UnexpectedCharacter { offset: 4 })
        ));
    }
}
