//! Scanner for Fathom source text
//!
//! The lexer produces the raw token list (the Lex stage), including comment
//! trivia. [`LexerSnapshot`] strips trivia and freezes the line-start index;
//! the parser and all position-based queries work against the snapshot.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{SyntaxError, SyntaxResult};
use crate::text::{LineIndex, Span};

/// Reserved words of the language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Keyword {
    Let,
    In,
    Each,
    If,
    Then,
    Else,
    Section,
    Shared,
    Optional,
    Nullable,
    As,
    True,
    False,
    Null,
    And,
    Or,
    Not,
}

impl Keyword {
    fn from_str(text: &str) -> Option<Self> {
        Some(match text {
            "let" => Keyword::Let,
            "in" => Keyword::In,
            "each" => Keyword::Each,
            "if" => Keyword::If,
            "then" => Keyword::Then,
            "else" => Keyword::Else,
            "section" => Keyword::Section,
            "shared" => Keyword::Shared,
            "optional" => Keyword::Optional,
            "nullable" => Keyword::Nullable,
            "as" => Keyword::As,
            "true" => Keyword::True,
            "false" => Keyword::False,
            "null" => Keyword::Null,
            "and" => Keyword::And,
            "or" => Keyword::Or,
            "not" => Keyword::Not,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Let => "let",
            Keyword::In => "in",
            Keyword::Each => "each",
            Keyword::If => "if",
            Keyword::Then => "then",
            Keyword::Else => "else",
            Keyword::Section => "section",
            Keyword::Shared => "shared",
            Keyword::Optional => "optional",
            Keyword::Nullable => "nullable",
            Keyword::As => "as",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Null => "null",
            Keyword::And => "and",
            Keyword::Or => "or",
            Keyword::Not => "not",
        }
    }

    /// All keywords, in a stable order
    pub fn all() -> &'static [Keyword] {
        &[
            Keyword::Let,
            Keyword::In,
            Keyword::Each,
            Keyword::If,
            Keyword::Then,
            Keyword::Else,
            Keyword::Section,
            Keyword::Shared,
            Keyword::Optional,
            Keyword::Nullable,
            Keyword::As,
            Keyword::True,
            Keyword::False,
            Keyword::Null,
            Keyword::And,
            Keyword::Or,
            Keyword::Not,
        ]
    }
}

/// Token classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    Identifier,
    /// `@name`, a self-referential (inclusive) identifier
    InclusiveIdentifier,
    Number,
    Text,
    Keyword(Keyword),
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Comma,
    Semicolon,
    Equals,
    FatArrow,
    Plus,
    Minus,
    Star,
    Slash,
    Ampersand,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    NotEqual,
    /// Line or block comment trivia; present at the Lex stage only
    Comment,
}

/// A single scanned token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

/// Raw scan result: every token including comment trivia
#[derive(Debug, Clone, PartialEq)]
pub struct LexState {
    pub tokens: Vec<Token>,
}

/// Trivia-free view of a lex result with a frozen line index
///
/// Owns the source text so downstream consumers can slice identifier
/// prefixes without holding the editor's buffer.
#[derive(Debug, Clone)]
pub struct LexerSnapshot {
    tokens: Vec<Token>,
    line_index: LineIndex,
    text: Arc<str>,
}

impl LexerSnapshot {
    /// Build a snapshot from a lex result, dropping comment trivia
    pub fn new(state: &LexState, text: &str) -> Self {
        let tokens = state
            .tokens
            .iter()
            .filter(|token| token.kind != TokenKind::Comment)
            .cloned()
            .collect();
        Self {
            tokens,
            line_index: LineIndex::new(text),
            text: Arc::from(text),
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The token containing the given offset, under the
    /// half-open-left, closed-right containment rule
    pub fn token_at(&self, offset: u32) -> Option<&Token> {
        self.tokens.iter().find(|token| token.span.contains(offset))
    }
}

/// Scan the entire document
///
/// Fails hard on characters the language cannot represent and on
/// unterminated literals; everything else is a parser concern.
pub fn lex(text: &str) -> SyntaxResult<LexState> {
    Scanner::new(text).run()
}

struct Scanner {
    /// Each source character paired with its absolute UTF-16 offset
    chars: Vec<(char, u32)>,
    /// Total length in UTF-16 code units
    total: u32,
    pos: usize,
    tokens: Vec<Token>,
}

impl Scanner {
    fn new(text: &str) -> Self {
        let mut chars = Vec::with_capacity(text.len());
        let mut offset = 0u32;
        for ch in text.chars() {
            chars.push((ch, offset));
            offset += ch.len_utf16() as u32;
        }
        Self {
            chars,
            total: offset,
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(ch, _)| *ch)
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).map(|(ch, _)| *ch)
    }

    fn offset(&self) -> u32 {
        self.chars
            .get(self.pos)
            .map(|(_, offset)| *offset)
            .unwrap_or(self.total)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn push(&mut self, kind: TokenKind, start: u32, text: String) {
        let end = self.offset();
        self.tokens.push(Token {
            kind,
            span: Span::new(start, end),
            text,
        });
    }

    fn run(mut self) -> SyntaxResult<LexState> {
        while let Some(ch) = self.peek() {
            let start = self.offset();
            match ch {
                _ if ch.is_whitespace() => {
                    self.bump();
                }
                '/' if self.peek_next() == Some('/') => self.line_comment(start),
                '/' if self.peek_next() == Some('*') => self.block_comment(start)?,
                '"' => self.text_literal(start)?,
                '@' => {
                    self.bump();
                    if !self.peek().map(is_identifier_start).unwrap_or(false) {
                        return Err(SyntaxError::IllegalCharacter { ch: '@', offset: start });
                    }
                    let name = self.identifier_text();
                    self.push(TokenKind::InclusiveIdentifier, start, format!("@{name}"));
                }
                _ if is_identifier_start(ch) => {
                    let text = self.identifier_text();
                    let kind = match Keyword::from_str(&text) {
                        Some(keyword) => TokenKind::Keyword(keyword),
                        None => TokenKind::Identifier,
                    };
                    self.push(kind, start, text);
                }
                _ if ch.is_ascii_digit() => {
                    let text = self.number_text();
                    self.push(TokenKind::Number, start, text);
                }
                _ => self.punctuation(ch, start)?,
            }
        }
        Ok(LexState { tokens: self.tokens })
    }

    fn identifier_text(&mut self) -> String {
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if is_identifier_continue(ch) {
                text.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        text
    }

    fn number_text(&mut self) -> String {
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        if self.peek() == Some('.') && self.peek_next().map(|c| c.is_ascii_digit()).unwrap_or(false)
        {
            text.push('.');
            self.bump();
            while let Some(ch) = self.peek() {
                if ch.is_ascii_digit() {
                    text.push(ch);
                    self.bump();
                } else {
                    break;
                }
            }
        }
        text
    }

    fn line_comment(&mut self, start: u32) {
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            text.push(ch);
            self.bump();
        }
        self.push(TokenKind::Comment, start, text);
    }

    fn block_comment(&mut self, start: u32) -> SyntaxResult<()> {
        let mut text = String::from("/*");
        self.bump();
        self.bump();
        loop {
            match self.peek() {
                None => return Err(SyntaxError::UnterminatedComment { offset: start }),
                Some('*') if self.peek_next() == Some('/') => {
                    text.push('*');
                    text.push('/');
                    self.bump();
                    self.bump();
                    break;
                }
                Some(ch) => {
                    text.push(ch);
                    self.bump();
                }
            }
        }
        self.push(TokenKind::Comment, start, text);
        Ok(())
    }

    fn text_literal(&mut self, start: u32) -> SyntaxResult<()> {
        let mut text = String::from("\"");
        self.bump();
        loop {
            match self.peek() {
                None => return Err(SyntaxError::UnterminatedText { offset: start }),
                // A doubled quote escapes itself
                Some('"') if self.peek_next() == Some('"') => {
                    text.push_str("\"\"");
                    self.bump();
                    self.bump();
                }
                Some('"') => {
                    text.push('"');
                    self.bump();
                    break;
                }
                Some(ch) => {
                    text.push(ch);
                    self.bump();
                }
            }
        }
        self.push(TokenKind::Text, start, text);
        Ok(())
    }

    fn punctuation(&mut self, ch: char, start: u32) -> SyntaxResult<()> {
        let kind = match ch {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '=' if self.peek_next() == Some('>') => {
                self.bump();
                self.bump();
                self.push(TokenKind::FatArrow, start, "=>".to_string());
                return Ok(());
            }
            '=' => TokenKind::Equals,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '&' => TokenKind::Ampersand,
            '<' if self.peek_next() == Some('=') => {
                self.bump();
                self.bump();
                self.push(TokenKind::LessEqual, start, "<=".to_string());
                return Ok(());
            }
            '<' if self.peek_next() == Some('>') => {
                self.bump();
                self.bump();
                self.push(TokenKind::NotEqual, start, "<>".to_string());
                return Ok(());
            }
            '<' => TokenKind::Less,
            '>' if self.peek_next() == Some('=') => {
                self.bump();
                self.bump();
                self.push(TokenKind::GreaterEqual, start, ">=".to_string());
                return Ok(());
            }
            '>' => TokenKind::Greater,
            _ => return Err(SyntaxError::IllegalCharacter { ch, offset: start }),
        };
        self.bump();
        self.push(kind, start, ch.to_string());
        Ok(())
    }
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_identifier_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}
