//! Tokenizer for Squawk source text
//!
//! A single left-to-right scan with two characters of lookahead. The second
//! character is only consulted to match two-character operators and to fold
//! a `-` that is directly followed by a digit into a negative integer
//! literal. That rule applies regardless of what precedes the `-`, so `a-1`
//! tokenizes as `a` followed by the literal `-1`.
//!
//! Newlines are kept as tokens; the parser skips them wherever they are not
//! significant.

use crate::error::LexError;
use serde::Serialize;

/// The kind of a token, carrying its literal value where it has one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    // Keywords
    Fn,
    If,
    Then,
    Else,
    Let,
    In,
    Return,
    IntType,
    BoolType,

    // Literals
    Integer(i64),
    True,
    False,

    Identifier(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Assign,
    EqEq,
    NotEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    Arrow,

    // Delimiters
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Semicolon,

    Newline,
    Eof,
}

/// Coarse classification of token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCategory {
    Keyword,
    Literal,
    Identifier,
    Operator,
    Delimiter,
    Newline,
    EndOfInput,
}

impl TokenKind {
    pub fn category(&self) -> TokenCategory {
        use TokenKind::*;
        match self {
            Fn | If | Then | Else | Let | In | Return | IntType | BoolType => {
                TokenCategory::Keyword
            }
            Integer(_) | True | False => TokenCategory::Literal,
            Identifier(_) => TokenCategory::Identifier,
            Plus | Minus | Star | Slash | Assign | EqEq | NotEq | Less | Greater | LessEq
            | GreaterEq | Arrow => TokenCategory::Operator,
            LParen | RParen | LBrace | RBrace | Comma | Colon | Semicolon => {
                TokenCategory::Delimiter
            }
            Newline => TokenCategory::Newline,
            Eof => TokenCategory::EndOfInput,
        }
    }

    /// Source spelling for fixed tokens, `None` for literals and identifiers
    pub fn lexeme(&self) -> Option<&'static str> {
        use TokenKind::*;
        let s = match self {
            Fn => "fn",
            If => "if",
            Then => "then",
            Else => "else",
            Let => "let",
            In => "in",
            Return => "return",
            IntType => "Int",
            BoolType => "Bool",
            True => "true",
            False => "false",
            Plus => "+",
            Minus => "-",
            Star => "*",
            Slash => "/",
            Assign => "=",
            EqEq => "==",
            NotEq => "!=",
            Less => "<",
            Greater => ">",
            LessEq => "<=",
            GreaterEq => ">=",
            Arrow => "->",
            LParen => "(",
            RParen => ")",
            LBrace => "{",
            RBrace => "}",
            Comma => ",",
            Colon => ":",
            Semicolon => ";",
            Integer(_) | Identifier(_) | Newline | Eof => return None,
        };
        Some(s)
    }
}

impl std::fmt::Display for TokenKind {
    /// Human-readable description used in diagnostics
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Integer(n) => write!(f, "integer {}", n),
            TokenKind::Identifier(name) => write!(f, "identifier '{}'", name),
            TokenKind::Newline => write!(f, "newline"),
            TokenKind::Eof => write!(f, "end of input"),
            other => match other.category() {
                TokenCategory::Keyword => write!(f, "keyword '{}'", other.lexeme().unwrap_or("?")),
                _ => write!(f, "'{}'", other.lexeme().unwrap_or("?")),
            },
        }
    }
}

/// A token with source position information
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column of the first character (1-indexed)
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Token { kind, line, column }
    }
}

fn keyword(ident: &str) -> Option<TokenKind> {
    let kind = match ident {
        "fn" => TokenKind::Fn,
        "if" => TokenKind::If,
        "then" => TokenKind::Then,
        "else" => TokenKind::Else,
        "let" => TokenKind::Let,
        "in" => TokenKind::In,
        "return" => TokenKind::Return,
        "Int" => TokenKind::IntType,
        "Bool" => TokenKind::BoolType,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        _ => return None,
    };
    Some(kind)
}

fn two_char_operator(first: char, second: char) -> Option<TokenKind> {
    match (first, second) {
        ('=', '=') => Some(TokenKind::EqEq),
        ('!', '=') => Some(TokenKind::NotEq),
        ('<', '=') => Some(TokenKind::LessEq),
        ('>', '=') => Some(TokenKind::GreaterEq),
        ('-', '>') => Some(TokenKind::Arrow),
        _ => None,
    }
}

fn single_char_token(ch: char) -> Option<TokenKind> {
    let kind = match ch {
        '+' => TokenKind::Plus,
        '-' => TokenKind::Minus,
        '*' => TokenKind::Star,
        '/' => TokenKind::Slash,
        '=' => TokenKind::Assign,
        '<' => TokenKind::Less,
        '>' => TokenKind::Greater,
        '(' => TokenKind::LParen,
        ')' => TokenKind::RParen,
        '{' => TokenKind::LBrace,
        '}' => TokenKind::RBrace,
        ',' => TokenKind::Comma,
        ':' => TokenKind::Colon,
        ';' => TokenKind::Semicolon,
        _ => return None,
    };
    Some(kind)
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Lexer {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
        }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek(0)?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek(0) {
                Some(' ' | '\t' | '\r') => {
                    self.advance();
                }
                Some('#') => {
                    while self.peek(0).is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn read_number(&mut self, line: usize, column: usize) -> Result<TokenKind, LexError> {
        let mut text = String::new();
        if self.peek(0) == Some('-') {
            text.push('-');
            self.advance();
        }
        while let Some(c) = self.peek(0).filter(char::is_ascii_digit) {
            text.push(c);
            self.advance();
        }
        text.parse::<i64>()
            .map(TokenKind::Integer)
            .map_err(|_| LexError::IntegerOverflow {
                literal: text,
                line,
                column,
            })
    }

    fn read_word(&mut self) -> TokenKind {
        let mut ident = String::new();
        while let Some(c) = self
            .peek(0)
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        {
            ident.push(c);
            self.advance();
        }
        keyword(&ident).unwrap_or(TokenKind::Identifier(ident))
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        loop {
            self.skip_trivia();
            let Some(ch) = self.peek(0) else {
                break;
            };
            let (line, column) = (self.line, self.column);

            if ch == '\n' {
                self.advance();
                self.tokens.push(Token::new(TokenKind::Newline, line, column));
                continue;
            }

            let next_is_digit = self.peek(1).is_some_and(|c| c.is_ascii_digit());
            if ch.is_ascii_digit() || (ch == '-' && next_is_digit) {
                let kind = self.read_number(line, column)?;
                self.tokens.push(Token::new(kind, line, column));
                continue;
            }

            if ch.is_ascii_alphabetic() || ch == '_' {
                let kind = self.read_word();
                self.tokens.push(Token::new(kind, line, column));
                continue;
            }

            if let Some(kind) = self.peek(1).and_then(|next| two_char_operator(ch, next)) {
                self.advance();
                self.advance();
                self.tokens.push(Token::new(kind, line, column));
                continue;
            }

            match single_char_token(ch) {
                Some(kind) => {
                    self.advance();
                    self.tokens.push(Token::new(kind, line, column));
                }
                None => return Err(LexError::UnexpectedChar { ch, line, column }),
            }
        }

        self.tokens
            .push(Token::new(TokenKind::Eof, self.line, self.column));
        Ok(self.tokens)
    }
}

/// Tokenize source text.
///
/// The returned sequence always ends with a single [`TokenKind::Eof`].
/// Tokenization is all-or-nothing: the first unrecognized character aborts
/// with a [`LexError`].
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).run()
}
