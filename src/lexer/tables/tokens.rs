// src/lexer/tables/tokens.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Token categories. Values are single bits so callers can build masks
/// (`TokenType::Whitespace.bits() | TokenType::Newline.bits()`), but a token
/// always carries exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u32)]
pub enum TokenType {
    Number = 1,
    Identifier = 2,
    String = 4,
    Whitespace = 8,
    OpenBracket = 16,
    CloseBracket = 32,
    Operator = 64,
    Symbol = 128,
    Newline = 256,
    DataLink = 512,
}

pub const N_TYPES: usize = 10;

const ALL_TYPES: [TokenType; N_TYPES] = [
    TokenType::Number,
    TokenType::Identifier,
    TokenType::String,
    TokenType::Whitespace,
    TokenType::OpenBracket,
    TokenType::CloseBracket,
    TokenType::Operator,
    TokenType::Symbol,
    TokenType::Newline,
    TokenType::DataLink,
];

/// Whitespace or newline.
pub const WHITESPACE_NEWLINE: u32 = TokenType::Whitespace as u32 | TokenType::Newline as u32;

impl TokenType {
    #[inline]
    pub fn bits(self) -> u32 {
        self as u32
    }

    /// Position of the category bit (0 for Number .. 9 for DataLink).
    #[inline]
    pub fn index(self) -> u32 {
        self.bits().trailing_zeros()
    }

    pub fn from_index(index: u32) -> Option<TokenType> {
        ALL_TYPES.get(index as usize).copied()
    }

    /// Decodes a single category bit. Composite masks are rejected.
    pub fn from_bits(bits: u32) -> Option<TokenType> {
        if !bits.is_power_of_two() {
            return None;
        }
        TokenType::from_index(bits.trailing_zeros())
    }

    #[inline]
    pub fn is_any(self, mask: u32) -> bool {
        self.bits() & mask != 0
    }

    pub fn name(self) -> &'static str {
        match self {
            TokenType::Number => "number",
            TokenType::Identifier => "identifier",
            TokenType::String => "string",
            TokenType::Whitespace => "whitespace",
            TokenType::OpenBracket => "open_bracket",
            TokenType::CloseBracket => "close_bracket",
            TokenType::Operator => "operator",
            TokenType::Symbol => "symbol",
            TokenType::Newline => "newline",
            TokenType::DataLink => "data_link",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts a category name (`"identifier"`) or its bit value (`"2"`).
impl FromStr for TokenType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(bits) = s.parse::<u32>() {
            return TokenType::from_bits(bits).ok_or_else(|| format!("not a token type bit: {bits}"));
        }
        ALL_TYPES
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| format!("unknown token type `{s}`"))
    }
}

/// Snapshot of the lexer's current token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub ty: TokenType,
    pub offset: usize,
    pub length: usize,
    pub line: usize,
    pub column: usize,
}

impl Token {
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}
