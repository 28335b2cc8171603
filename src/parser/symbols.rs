// src/parser/symbols.rs
// Translation from lexed tokens to grammar terminal ids.

use hashbrown::HashMap;

use super::config::GrammarConfig;
use crate::lexer::{Lexer, TokenType};

/// Returned by `classify` when neither the text nor the type is mapped.
pub const NO_TERMINAL: u32 = u32::MAX;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolMap {
    text: HashMap<String, u32>,
    types: HashMap<TokenType, u32>,
}

impl SymbolMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_text(&mut self, text: impl Into<String>, terminal: u32) -> &mut Self {
        self.text.insert(text.into(), terminal);
        self
    }

    pub fn insert_type(&mut self, ty: TokenType, terminal: u32) -> &mut Self {
        self.types.insert(ty, terminal);
        self
    }

    pub fn by_text(&self, text: &str) -> Option<u32> {
        self.text.get(text).copied()
    }

    pub fn by_type(&self, ty: TokenType) -> Option<u32> {
        self.types.get(&ty).copied()
    }

    pub fn texts(&self) -> impl Iterator<Item = (&str, u32)> {
        self.text.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn types(&self) -> impl Iterator<Item = (TokenType, u32)> + '_ {
        self.types.iter().map(|(k, v)| (*k, *v))
    }

    /// Terminal id of the lexer's current token.
    ///
    /// Identifiers prefer an exact keyword entry; literal and layout tokens map
    /// by type; custom multi-character symbols get the generic symbol terminal
    /// when one is configured; other punctuation maps by text, then type.
    pub fn classify(&self, lexer: &Lexer, config: &GrammarConfig) -> u32 {
        if lexer.is_end() {
            return config.eof_terminal;
        }
        let ty = lexer.ty();
        let found = match ty {
            TokenType::Identifier => self.by_text(lexer.text()).or_else(|| self.by_type(ty)),
            TokenType::Number
            | TokenType::String
            | TokenType::Whitespace
            | TokenType::Newline
            | TokenType::DataLink => self.by_type(ty).or_else(|| self.by_text(lexer.text())),
            // Plain scanning yields one-character punctuation, so anything
            // longer came from the custom symbol trie.
            TokenType::Operator | TokenType::Symbol
                if config.symbol_terminal.is_some() && lexer.text().chars().nth(1).is_some() =>
            {
                config.symbol_terminal
            }
            _ => self.by_text(lexer.text()).or_else(|| self.by_type(ty)),
        };
        found.unwrap_or(NO_TERMINAL)
    }

    /// Multi-character entries that the plain lexer would split, for the
    /// lexer's custom symbol trie.
    pub fn custom_symbols(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .text
            .keys()
            .map(String::as_str)
            .filter(|s| s.chars().count() > 1 && !is_word(s))
            .collect();
        out.sort_unstable();
        out
    }
}

fn is_word(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        Some(c) if c.is_ascii_digit() => chars.all(|c| c.is_ascii_digit() || c == '.'),
        _ => false,
    }
}
