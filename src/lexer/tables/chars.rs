// src/lexer/tables/chars.rs
// Character classification for the hand-written lexer.
//
// Two independent lookups per ASCII byte:
//   JUMP_TABLE              byte -> coarse category (CharClass as u8)
//   NUMBER_AND_IDENTIFIER   byte -> 0 | 2 (ident) | 4 (number) | 8 (both)
// Bytes >= 128 are not in the tables and classify as Symbol.

/// Coarse lexical category of a single byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CharClass {
    Number = 0,
    Identifier = 1,
    String = 2,
    Space = 3,
    Tab = 4,
    CarriageReturn = 5,
    LineFeed = 6,
    Symbol = 7,
    Operator = 8,
    OpenBracket = 9,
    CloseBracket = 10,
    DataLinkEscape = 11,
}

impl CharClass {
    #[inline]
    pub fn of(b: u8) -> CharClass {
        if b >= 128 {
            return CharClass::Symbol;
        }
        match JUMP_TABLE[b as usize] {
            0 => CharClass::Number,
            1 => CharClass::Identifier,
            2 => CharClass::String,
            3 => CharClass::Space,
            4 => CharClass::Tab,
            5 => CharClass::CarriageReturn,
            6 => CharClass::LineFeed,
            8 => CharClass::Operator,
            9 => CharClass::OpenBracket,
            10 => CharClass::CloseBracket,
            11 => CharClass::DataLinkEscape,
            _ => CharClass::Symbol,
        }
    }

    /// Space, tab, CR or LF (jump categories 3..=6).
    #[inline]
    pub fn is_whitespace(self) -> bool {
        matches!(
            self,
            CharClass::Space | CharClass::Tab | CharClass::CarriageReturn | CharClass::LineFeed
        )
    }
}

pub const IDENT: u8 = 2;
pub const NUMBER: u8 = 4;
pub const IDENT_AND_NUMBER: u8 = 8;

/// Mask tested while extending a number token.
pub const NUMBER_CONTINUE: u8 = NUMBER | IDENT_AND_NUMBER;
/// Mask tested while extending an identifier token.
pub const IDENT_CONTINUE: u8 = IDENT | IDENT_AND_NUMBER;

const DLE: u8 = 0x10;

pub const JUMP_TABLE: [u8; 128] = {
    let mut table = [CharClass::Symbol as u8; 128];
    let mut i = 0;
    while i < 128 {
        let c = i as u8;
        table[i] = match c {
            b'0'..=b'9' => CharClass::Number as u8,
            b'a'..=b'z' | b'A'..=b'Z' | b'$' | b'_' => CharClass::Identifier as u8,
            b'"' | b'\'' | b'`' => CharClass::String as u8,
            b' ' => CharClass::Space as u8,
            b'\t' => CharClass::Tab as u8,
            b'\r' => CharClass::CarriageReturn as u8,
            b'\n' => CharClass::LineFeed as u8,
            b'!' | b'%' | b'&' | b'*' | b'+' | b'-' | b'/' | b'<' | b'=' | b'>' | b'^'
            | b'|' | b'~' => CharClass::Operator as u8,
            b'(' | b'[' | b'{' => CharClass::OpenBracket as u8,
            b')' | b']' | b'}' => CharClass::CloseBracket as u8,
            DLE => CharClass::DataLinkEscape as u8,
            _ => CharClass::Symbol as u8,
        };
        i += 1;
    }
    table
};

pub const NUMBER_AND_IDENTIFIER: [u8; 128] = {
    let mut table = [0u8; 128];
    let mut i = 0;
    while i < 128 {
        let c = i as u8;
        table[i] = match c {
            b'0'..=b'9' => IDENT_AND_NUMBER,
            b'.' => NUMBER,
            b'a'..=b'z' | b'A'..=b'Z' | b'$' => IDENT,
            _ => 0,
        };
        i += 1;
    }
    table
};

/// Standard table plus `-` and `_` as identifier continuation (CSS-style names).
pub const EXTENDED_NUMBER_AND_IDENTIFIER: [u8; 128] = {
    let mut table = NUMBER_AND_IDENTIFIER;
    table[b'-' as usize] = IDENT;
    table[b'_' as usize] = IDENT;
    table
};

/// Which identifier table a lexer consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdTable {
    #[default]
    Standard,
    Extended,
}

impl IdTable {
    #[inline]
    pub fn mask(self, b: u8) -> u8 {
        if b >= 128 {
            return 0;
        }
        match self {
            IdTable::Standard => NUMBER_AND_IDENTIFIER[b as usize],
            IdTable::Extended => EXTENDED_NUMBER_AND_IDENTIFIER[b as usize],
        }
    }
}
