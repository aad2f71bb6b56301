use std::{collections::BTreeMap, str::Chars};

use itertools::{PeekNth, peek_nth};
use once_cell::sync::Lazy;
use strum::EnumString;

use crate::{
    frontend::{SourceFile, parser::ParseError},
    middle::ty::Type,
};

#[derive(Debug)]
pub struct Lexer<'source> {
    source: &'source SourceFile,
    position: usize,
    chars: PeekNth<Chars<'source>>,
}

#[derive(Debug, Clone, Copy)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /* Words */
    Keyword(Keyword), // while
    Identifier,       // main

    /* Literals */
    BooleanLiteral, // true
    IntegerLiteral, // 1
    DoubleLiteral,  // 1.0

    /* Delimiters */
    OpenParen,  // (
    CloseParen, // )
    OpenBrace,  // {
    CloseBrace, // }
    Semicolon,  // ;
    Comma,      // ,

    /* Unary Ops */
    Increment, // ++
    Decrement, // --

    /* Binary Ops */
    Plus,                 // +
    Minus,                // -
    Asterisk,             // *
    Divide,               // /
    LogicalAnd,           // &&
    LogicalOr,            // ||
    DoubleEquals,         // ==
    NotEquals,            // !=
    LessThan,             // <
    LessThanOrEqualTo,    // <=
    GreaterThan,          // >
    GreaterThanOrEqualTo, // >=

    /* Assignment */
    Equals, // =
}

impl TokenKind {
    pub fn is_equality_operator(&self) -> bool {
        matches!(self, Self::DoubleEquals | Self::NotEquals)
    }

    pub fn is_relational_operator(&self) -> bool {
        matches!(
            self,
            Self::LessThan
                | Self::LessThanOrEqualTo
                | Self::GreaterThan
                | Self::GreaterThanOrEqualTo
        )
    }

    pub fn is_term_operator(&self) -> bool {
        matches!(self, Self::Plus | Self::Minus)
    }

    pub fn is_factor_operator(&self) -> bool {
        matches!(self, Self::Asterisk | Self::Divide)
    }

    pub fn is_increment_operator(&self) -> bool {
        matches!(self, Self::Increment | Self::Decrement)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Keyword {
    If,
    Else,
    While,
    Return,
    Bool,
    Int,
    Double,
    Void,
}

impl Keyword {
    /// The type named by a type keyword
    pub fn as_type(self) -> Option<Type> {
        match self {
            Keyword::Bool => Some(Type::Bool),
            Keyword::Int => Some(Type::Int),
            Keyword::Double => Some(Type::Double),
            Keyword::Void => Some(Type::Void),
            Keyword::If | Keyword::Else | Keyword::While | Keyword::Return => None,
        }
    }
}

/// Table of single char tokens (matched after longer sequences are checked for)
static SINGLE_TOKENS: Lazy<BTreeMap<char, TokenKind>> = Lazy::new(|| {
    BTreeMap::from([
        ('(', TokenKind::OpenParen),
        (')', TokenKind::CloseParen),
        ('{', TokenKind::OpenBrace),
        ('}', TokenKind::CloseBrace),
        (';', TokenKind::Semicolon),
        (',', TokenKind::Comma),
        ('+', TokenKind::Plus),
        ('-', TokenKind::Minus),
        ('*', TokenKind::Asterisk),
        ('/', TokenKind::Divide),
        ('<', TokenKind::LessThan),
        ('>', TokenKind::GreaterThan),
        ('=', TokenKind::Equals),
    ])
});

/// Table of two char tokens
static DOUBLE_TOKENS: Lazy<BTreeMap<[char; 2], TokenKind>> = Lazy::new(|| {
    BTreeMap::from([
        (['+', '+'], TokenKind::Increment),
        (['-', '-'], TokenKind::Decrement),
        (['&', '&'], TokenKind::LogicalAnd),
        (['|', '|'], TokenKind::LogicalOr),
        (['=', '='], TokenKind::DoubleEquals),
        (['!', '='], TokenKind::NotEquals),
        (['<', '='], TokenKind::LessThanOrEqualTo),
        (['>', '='], TokenKind::GreaterThanOrEqualTo),
    ])
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn to(self, other: Span) -> Span {
        Span::new(self.start, other.end)
    }
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source SourceFile) -> Self {
        Self {
            source,
            chars: peek_nth(source.contents.chars()),
            position: 0,
        }
    }

    /// Reads the whole source file into a token list
    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();

        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }

        Ok(tokens)
    }

    fn error(&self, start: usize, message: impl Into<String>) -> ParseError {
        ParseError::new(message, Span::new(start, self.position.max(start + 1)))
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.position += c.len_utf8();
        Some(c)
    }

    fn peek_is(&mut self, n: usize, expected: char) -> bool {
        self.chars.peek_nth(n).is_some_and(|c| *c == expected)
    }

    fn ignore_line(&mut self) {
        while let Some(c) = self.chars.peek().copied() {
            if c == '\n' {
                break;
            }

            self.bump();
        }
    }

    fn ignore_block_comment(&mut self) -> Result<(), ParseError> {
        let start_position = self.position;

        // Consume the opening `/*`
        self.bump();
        self.bump();

        while self.chars.peek().is_some() {
            if self.peek_is(0, '*') && self.peek_is(1, '/') {
                self.bump();
                self.bump();
                return Ok(());
            }

            self.bump();
        }

        Err(self.error(
            start_position,
            "Reached end of file while reading block comment",
        ))
    }

    // Keyword, identifier, or boolean literal
    fn read_word(&mut self) -> Token {
        let start_position = self.position;

        while let Some(c) = self.chars.peek().copied() {
            if !(c.is_ascii_alphanumeric() || c == '_') {
                break;
            }

            self.bump();
        }

        let span = self.new_span(start_position);
        let value = self.source.value_of_span(span);

        let kind = if let Ok(keyword) = value.parse() {
            TokenKind::Keyword(keyword)
        } else {
            match value {
                "true" | "false" => TokenKind::BooleanLiteral,
                _ => TokenKind::Identifier,
            }
        };

        Token { kind, span }
    }

    // 12, 1.5, 2.0e-3
    fn read_number(&mut self) -> Token {
        let start_position = self.position;
        let mut kind = TokenKind::IntegerLiteral;

        self.read_digits();

        if self.peek_is(0, '.')
            && self
                .chars
                .peek_nth(1)
                .is_some_and(|c| c.is_ascii_digit())
        {
            kind = TokenKind::DoubleLiteral;
            self.bump();
            self.read_digits();

            let has_exponent = (self.peek_is(0, 'e') || self.peek_is(0, 'E'))
                && (self.chars.peek_nth(1).is_some_and(|c| c.is_ascii_digit())
                    || ((self.peek_is(1, '-') || self.peek_is(1, '+'))
                        && self.chars.peek_nth(2).is_some_and(|c| c.is_ascii_digit())));

            if has_exponent {
                self.bump();
                if self.peek_is(0, '-') || self.peek_is(0, '+') {
                    self.bump();
                }
                self.read_digits();
            }
        }

        Token {
            kind,
            span: self.new_span(start_position),
        }
    }

    fn read_digits(&mut self) {
        while self.chars.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
    }

    fn read_tokens(&mut self, count: usize, kind: TokenKind) -> Token {
        let start_position = self.position;

        for _ in 0..count {
            self.bump();
        }

        Token {
            kind,
            span: self.new_span(start_position),
        }
    }

    fn new_span(&self, start: usize) -> Span {
        Span {
            start,
            end: self.position,
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, ParseError> {
        while let Some(c) = self.chars.peek().copied() {
            if !c.is_ascii() {
                return Err(self.error(
                    self.position,
                    format!("Unexpected non-ascii character in stream: `{c}`"),
                ));
            }

            let token = match c {
                // Ignore whitespace
                c if c.is_ascii_whitespace() => {
                    self.bump();
                    continue;
                }
                // Ignore comments and preprocessor lines
                '/' if self.peek_is(1, '/') => {
                    self.ignore_line();
                    continue;
                }
                '#' => {
                    self.ignore_line();
                    continue;
                }
                '/' if self.peek_is(1, '*') => {
                    self.ignore_block_comment()?;
                    continue;
                }

                // Integer and double literals
                n if n.is_ascii_digit() => self.read_number(),

                // Identifiers, keywords, and boolean literals
                a if a.is_ascii_alphabetic() || a == '_' => self.read_word(),

                c => {
                    let pair = self.chars.peek_nth(1).map(|next| [c, *next]);

                    if let Some(kind) = pair.and_then(|pair| DOUBLE_TOKENS.get(&pair)).copied() {
                        self.read_tokens(2, kind)
                    } else if let Some(kind) = SINGLE_TOKENS.get(&c).copied() {
                        self.read_tokens(1, kind)
                    } else {
                        return Err(self.error(
                            self.position,
                            format!("Unexpected character in stream: `{c}`"),
                        ));
                    }
                }
            };

            return Ok(Some(token));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let source = SourceFile::from_memory(source);

        Lexer::new(&source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_operators_longest_first() {
        assert_eq!(
            kinds("i++ <= --j && k != 3 || l == m"),
            vec![
                TokenKind::Identifier,
                TokenKind::Increment,
                TokenKind::LessThanOrEqualTo,
                TokenKind::Decrement,
                TokenKind::Identifier,
                TokenKind::LogicalAnd,
                TokenKind::Identifier,
                TokenKind::NotEquals,
                TokenKind::IntegerLiteral,
                TokenKind::LogicalOr,
                TokenKind::Identifier,
                TokenKind::DoubleEquals,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn lexes_keywords_and_literals() {
        assert_eq!(
            kinds("int x = 42; double d = 1.5e-3; bool b = true;"),
            vec![
                TokenKind::Keyword(Keyword::Int),
                TokenKind::Identifier,
                TokenKind::Equals,
                TokenKind::IntegerLiteral,
                TokenKind::Semicolon,
                TokenKind::Keyword(Keyword::Double),
                TokenKind::Identifier,
                TokenKind::Equals,
                TokenKind::DoubleLiteral,
                TokenKind::Semicolon,
                TokenKind::Keyword(Keyword::Bool),
                TokenKind::Identifier,
                TokenKind::Equals,
                TokenKind::BooleanLiteral,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn skips_comments() {
        assert_eq!(
            kinds("#include <stdio>\n// line\n/* block\n comment */ return"),
            vec![TokenKind::Keyword(Keyword::Return)]
        );
    }

    #[test]
    fn reports_unterminated_block_comment() {
        let source = SourceFile::from_memory("int /* never closed");

        let error = Lexer::new(&source).tokenize().unwrap_err();

        assert_eq!(error.span.start, 4);
    }

    #[test]
    fn reports_unexpected_characters() {
        let source = SourceFile::from_memory("int x = 1 @ 2;");

        assert!(Lexer::new(&source).tokenize().is_err());
    }
}
