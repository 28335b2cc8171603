// src/lexer/symbols.rs
// Trie of custom multi-character symbols ("=>", "...", "</") injected into a lexer.

use hashbrown::HashMap;

#[derive(Debug, Clone, Default)]
pub struct SymbolTrie {
    children: HashMap<char, SymbolTrie>,
    is_symbol: bool,
}

impl SymbolTrie {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: &str) {
        if symbol.is_empty() {
            return;
        }
        let mut node = self;
        for c in symbol.chars() {
            node = node.children.entry(c).or_default();
        }
        node.is_symbol = true;
    }

    pub fn contains(&self, symbol: &str) -> bool {
        let mut node = self;
        for c in symbol.chars() {
            match node.children.get(&c) {
                Some(n) => node = n,
                None => return false,
            }
        }
        node.is_symbol && !symbol.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Byte length of the longest symbol that starts `text`, if any.
    pub fn longest_match(&self, text: &str) -> Option<usize> {
        let mut node = self;
        let mut best = None;
        for (i, c) in text.char_indices() {
            match node.children.get(&c) {
                Some(n) => {
                    node = n;
                    if node.is_symbol {
                        best = Some(i + c.len_utf8());
                    }
                }
                None => break,
            }
        }
        best
    }
}
