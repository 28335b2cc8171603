// src/lexer/cursor.rs
// Hand-written cursor lexer. One token is live at a time; `next` replaces it.
// Lexers over the same `Arc<str>` can be copied, synced, fenced and peeked
// without re-reading the source.

use std::sync::Arc;

use super::{
    diagnostics::{self, Excerpt},
    symbols::SymbolTrie,
    tables::{
        CharClass,
        IdTable,
        Token,
        TokenType,
        WHITESPACE_NEWLINE,
        chars::{IDENT_CONTINUE, NUMBER_CONTINUE},
    },
};
use crate::error::LexError;

/// Length of a data-link-escape token in characters (DLE + payload).
const DATA_LINK_CHARS: usize = 4;

#[derive(Debug)]
pub struct Lexer {
    source: Arc<str>,
    /// Effective end of input; lowered by `fence` and `trim`.
    end: usize,
    off: usize,
    len: usize,
    ty: TokenType,
    line: usize,
    line_start: usize,
    column: usize,
    ignore_whitespace: bool,
    characters_only: bool,
    parse_string: bool,
    id_table: IdTable,
    symbols: Option<Arc<SymbolTrie>>,
    peek: Option<Box<Lexer>>,
}

impl Lexer {
    /// Lexer that skips whitespace and newline tokens, positioned on the first token.
    pub fn new(source: impl Into<Arc<str>>) -> Self {
        let mut lex = Self::unprimed(source.into());
        lex.next();
        lex
    }

    /// Lexer that reports whitespace and newline tokens.
    pub fn with_whitespace(source: impl Into<Arc<str>>) -> Self {
        let mut lex = Self::unprimed(source.into());
        lex.ignore_whitespace = false;
        lex.next();
        lex
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LexError> {
        let s = std::str::from_utf8(bytes)?;
        Ok(Self::new(s))
    }

    fn unprimed(source: Arc<str>) -> Self {
        let end = source.len();
        Self {
            source,
            end,
            off: 0,
            len: 0,
            ty: TokenType::Symbol,
            line: 0,
            line_start: 0,
            column: 0,
            ignore_whitespace: true,
            characters_only: false,
            parse_string: false,
            id_table: IdTable::Standard,
            symbols: None,
            peek: None,
        }
    }

    // ------------------------------------------------------------------
    // accessors
    // ------------------------------------------------------------------

    pub fn source(&self) -> &Arc<str> {
        &self.source
    }

    /// Text of the current token.
    pub fn text(&self) -> &str {
        &self.source[self.off..self.off + self.len]
    }

    /// Character at the current offset.
    pub fn ch(&self) -> Option<char> {
        self.source.get(self.off..self.end)?.chars().next()
    }

    pub fn ty(&self) -> TokenType {
        self.ty
    }

    pub fn offset(&self) -> usize {
        self.off
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 0-based line of the current token.
    pub fn line(&self) -> usize {
        self.line
    }

    /// 0-based column (in characters) of the current token.
    pub fn column(&self) -> usize {
        self.column
    }

    /// Effective length of the scanned range.
    pub fn string_length(&self) -> usize {
        self.end
    }

    pub fn is_end(&self) -> bool {
        self.off >= self.end
    }

    pub fn token(&self) -> Token {
        Token {
            ty: self.ty,
            offset: self.off,
            length: self.len,
            line: self.line,
            column: self.column,
        }
    }

    pub fn ignores_whitespace(&self) -> bool {
        self.ignore_whitespace
    }

    pub fn same_source(&self, other: &Lexer) -> bool {
        Arc::ptr_eq(&self.source, &other.source) || *self.source == *other.source
    }

    // ------------------------------------------------------------------
    // flags
    // ------------------------------------------------------------------

    pub fn set_ignore_whitespace(&mut self, on: bool) -> &mut Self {
        self.ignore_whitespace = on;
        self
    }

    /// Clamp every token to a single character.
    pub fn set_characters_only(&mut self, on: bool) -> &mut Self {
        self.characters_only = on;
        self
    }

    /// Quote characters become one-character symbols instead of string tokens.
    pub fn set_parse_string(&mut self, on: bool) -> &mut Self {
        self.parse_string = on;
        self
    }

    /// Treat `-` and `_` as identifier characters and re-lex the current token.
    pub fn use_extended_id(&mut self) -> &mut Self {
        self.id_table = IdTable::Extended;
        self.rescan()
    }

    // ------------------------------------------------------------------
    // custom symbols
    // ------------------------------------------------------------------

    /// Register a multi-character symbol. It is matched at the start of any
    /// token, including after skipped whitespace and newlines.
    pub fn add_symbol(&mut self, symbol: &str) -> &mut Self {
        let trie = self.symbols.get_or_insert_with(Default::default);
        Arc::make_mut(trie).insert(symbol);
        self
    }

    pub fn add_character(&mut self, ch: char) -> &mut Self {
        let mut buf = [0u8; 4];
        self.add_symbol(ch.encode_utf8(&mut buf))
    }

    /// Share a prebuilt trie; later `add_symbol` calls copy it on write.
    pub fn set_symbols(&mut self, trie: Arc<SymbolTrie>) -> &mut Self {
        self.symbols = Some(trie);
        self
    }

    // ------------------------------------------------------------------
    // scanning
    // ------------------------------------------------------------------

    /// Advance to the next token.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> &mut Self {
        self.scan(true);
        self
    }

    /// Advance to the next token without consulting the custom symbol trie.
    pub fn next_plain(&mut self) -> &mut Self {
        self.scan(false);
        self
    }

    /// Re-lex the token at the current offset.
    pub fn rescan(&mut self) -> &mut Self {
        self.len = 0;
        self.next()
    }

    /// Re-lex the token at the current offset with plain classification only.
    pub fn rescan_plain(&mut self) -> &mut Self {
        self.len = 0;
        self.next_plain()
    }

    /// Move forward to byte offset `to` (clamped to the end of input) and lex
    /// the token found there. Offsets behind the cursor are ignored.
    pub fn jump_to(&mut self, to: usize) -> &mut Self {
        let to = to.min(self.end);
        if to > self.off {
            self.skip_to(to);
        } else {
            self.len = 0;
        }
        self.next()
    }

    fn scan(&mut self, use_symbols: bool) {
        let source = Arc::clone(&self.source);
        let bytes = source.as_bytes();
        let end = self.end;
        let mut line = self.line;
        let mut line_start = self.line_start;
        let mut off = (self.off + self.len).min(end);
        // A newline is counted once the cursor moves past it, and only for the
        // bytes actually consumed: a CR taken on its own from a CRLF token
        // leaves the LF to be counted.
        if self.ty == TokenType::Newline {
            count_newlines(bytes, self.off.min(off), off, end, &mut line, &mut line_start);
        }

        if off >= end {
            self.commit(end, 0, TokenType::Symbol, line, line_start);
            return;
        }

        loop {
            let base = off;
            let b = bytes[base];
            let custom = match self.symbols.as_deref() {
                Some(trie) if use_symbols => trie.longest_match(&source[base..end]),
                _ => None,
            };
            if let Some(n) = custom {
                let ty = if CharClass::of(b) == CharClass::Operator {
                    TokenType::Operator
                } else {
                    TokenType::Symbol
                };
                self.commit(base, n, ty, line, line_start);
                return;
            }
            let (ty, len) = match CharClass::of(b) {
                CharClass::Number => {
                    let mut p = self.number_run(bytes, base + 1);
                    if p < end && (bytes[p] == b'e' || bytes[p] == b'E') {
                        let mut q = p + 1;
                        if q < end && (bytes[q] == b'-' || bytes[q] == b'+') {
                            q += 1;
                        }
                        if q < end && bytes[q].is_ascii_digit() {
                            // Exponent suffix is a nested number scan spliced onto the mantissa.
                            p = self.number_run(bytes, q);
                        }
                    }
                    (TokenType::Number, p - base)
                }
                CharClass::Identifier => {
                    let mut p = base + 1;
                    while p < end && self.id_table.mask(bytes[p]) & IDENT_CONTINUE != 0 {
                        p += 1;
                    }
                    (TokenType::Identifier, p - base)
                }
                CharClass::String => {
                    if self.parse_string {
                        (TokenType::Symbol, 1)
                    } else {
                        let close = bytes[base + 1..end].iter().position(|&c| c == b);
                        match close {
                            Some(i) => (TokenType::String, i + 2),
                            None => (TokenType::String, end - base),
                        }
                    }
                }
                CharClass::Space => (TokenType::Whitespace, run_of(bytes, base, end, b' ')),
                CharClass::Tab => (TokenType::Whitespace, run_of(bytes, base, end, b'\t')),
                CharClass::CarriageReturn => {
                    let len = if base + 1 < end && bytes[base + 1] == b'\n' {
                        2
                    } else {
                        1
                    };
                    (TokenType::Newline, len)
                }
                CharClass::LineFeed => (TokenType::Newline, 1),
                CharClass::Operator => (TokenType::Operator, 1),
                CharClass::OpenBracket => (TokenType::OpenBracket, 1),
                CharClass::CloseBracket => (TokenType::CloseBracket, 1),
                CharClass::DataLinkEscape => {
                    let len = source[base..end]
                        .char_indices()
                        .nth(DATA_LINK_CHARS)
                        .map(|(i, _)| i)
                        .unwrap_or(end - base);
                    (TokenType::DataLink, len)
                }
                CharClass::Symbol => {
                    let len = source[base..end].chars().next().map_or(1, char::len_utf8);
                    (TokenType::Symbol, len)
                }
            };

            if self.ignore_whitespace && ty.is_any(WHITESPACE_NEWLINE) {
                if ty == TokenType::Newline {
                    count_newlines(bytes, base, base + len, end, &mut line, &mut line_start);
                }
                off = base + len;
                if off < end {
                    continue;
                }
                self.commit(end, 0, TokenType::Symbol, line, line_start);
                return;
            }

            let len = if self.characters_only {
                source[base..].chars().next().map_or(0, char::len_utf8).min(len)
            } else {
                len
            };
            self.commit(base, len.min(end - base), ty, line, line_start);
            return;
        }
    }

    fn number_run(&self, bytes: &[u8], mut p: usize) -> usize {
        while p < self.end && self.id_table.mask(bytes[p]) & NUMBER_CONTINUE != 0 {
            p += 1;
        }
        p
    }

    fn commit(&mut self, off: usize, len: usize, ty: TokenType, line: usize, line_start: usize) {
        self.off = off;
        self.len = len;
        self.ty = ty;
        self.line = line;
        self.line_start = line_start;
        self.column = self.column_at(off);
    }

    fn column_at(&self, off: usize) -> usize {
        if off < self.line_start {
            return 0;
        }
        self.source[self.line_start..off].chars().count()
    }

    /// Move the cursor forward to `to`, counting the newlines passed over.
    fn skip_to(&mut self, to: usize) {
        let from = self.off.min(to);
        count_newlines(
            self.source.as_bytes(),
            from,
            to,
            self.end,
            &mut self.line,
            &mut self.line_start,
        );
        self.off = to;
        self.len = 0;
        self.column = self.column_at(to);
    }

    // ------------------------------------------------------------------
    // cursors
    // ------------------------------------------------------------------

    /// Independent lexer at the same position. The peek cache is not copied.
    pub fn copy(&self) -> Lexer {
        self.clone_without_peek()
    }

    pub fn copy_into(&self, dest: &mut Lexer) {
        dest.source = Arc::clone(&self.source);
        dest.symbols = self.symbols.clone();
        dest.id_table = self.id_table;
        dest.end = self.end;
        self.copy_position_into(dest);
    }

    fn clone_without_peek(&self) -> Lexer {
        Lexer {
            source: Arc::clone(&self.source),
            end: self.end,
            off: self.off,
            len: self.len,
            ty: self.ty,
            line: self.line,
            line_start: self.line_start,
            column: self.column,
            ignore_whitespace: self.ignore_whitespace,
            characters_only: self.characters_only,
            parse_string: self.parse_string,
            id_table: self.id_table,
            symbols: self.symbols.clone(),
            peek: None,
        }
    }

    fn copy_position_into(&self, dest: &mut Lexer) {
        dest.off = self.off;
        dest.len = self.len;
        dest.ty = self.ty;
        dest.line = self.line;
        dest.line_start = self.line_start;
        dest.column = self.column;
        dest.ignore_whitespace = self.ignore_whitespace;
        dest.characters_only = self.characters_only;
        dest.parse_string = self.parse_string;
    }

    /// Cached lookahead cursor one token past this lexer's current token.
    pub fn peek(&mut self) -> &Lexer {
        let mut p = self
            .peek
            .take()
            .unwrap_or_else(|| Box::new(self.clone_without_peek()));
        self.copy_into(&mut p);
        p.next();
        self.peek.insert(p)
    }

    /// Cached lookahead cursor one token past `marker`'s current token.
    pub fn peek_from(&mut self, marker: &Lexer) -> &Lexer {
        let mut p = self
            .peek
            .take()
            .unwrap_or_else(|| Box::new(marker.clone_without_peek()));
        marker.copy_into(&mut p);
        p.next();
        self.peek.insert(p)
    }

    /// Take over `marker`'s position and flags.
    pub fn sync(&mut self, marker: &Lexer) -> Result<&mut Self, LexError> {
        if !self.same_source(marker) {
            return Err(LexError::SourceMismatch { op: "sync" });
        }
        marker.copy_position_into(self);
        self.clamp_to_end();
        Ok(self)
    }

    /// Limit this lexer's input to end where `marker` currently is.
    pub fn fence(&mut self, marker: &Lexer) -> Result<&mut Self, LexError> {
        if !self.same_source(marker) {
            return Err(LexError::SourceMismatch { op: "fence" });
        }
        self.end = marker.off.min(self.source.len());
        self.clamp_to_end();
        Ok(self)
    }

    fn clamp_to_end(&mut self) {
        if self.off >= self.end {
            self.off = self.end;
            self.len = 0;
        } else {
            self.len = self.len.min(self.end - self.off);
        }
    }

    /// New lexer over the current range with surrounding whitespace removed,
    /// keeping up to `leading_keep` / `trailing_keep` whitespace characters
    /// next to the content.
    pub fn trim(&self, leading_keep: usize, trailing_keep: usize) -> Lexer {
        let mut lex = self.copy();
        let bytes = self.source.as_bytes();

        let mut lead_end = self.off.min(lex.end);
        while lead_end < lex.end && CharClass::of(bytes[lead_end]).is_whitespace() {
            lead_end += 1;
        }
        let start = lead_end - leading_keep.min(lead_end - self.off.min(lead_end));

        let mut tail = lex.end;
        while tail > lead_end && CharClass::of(bytes[tail - 1]).is_whitespace() {
            tail -= 1;
        }
        let end = tail + trailing_keep.min(lex.end - tail);

        lex.skip_to(start);
        lex.end = end.max(start);
        if leading_keep > 0 {
            lex.ignore_whitespace = false;
        }
        lex.next();
        lex
    }

    // ------------------------------------------------------------------
    // assertions and diagnostics
    // ------------------------------------------------------------------

    /// Consume the current token if its text equals `text`.
    pub fn assert_text(&mut self, text: &str) -> Result<&mut Self, LexError> {
        if self.text() == text && !self.is_end() {
            self.next();
            Ok(self)
        } else {
            let found = self.found_text();
            Err(self.error(&format!("Expected [{text}] but found [{found}]")))
        }
    }

    /// Consume exactly one character if it equals `ch`.
    pub fn assert_char(&mut self, ch: char) -> Result<&mut Self, LexError> {
        if self.ch() == Some(ch) && !self.is_end() {
            self.len = ch.len_utf8();
            self.next();
            Ok(self)
        } else {
            let found = self.ch().map(String::from).unwrap_or_else(|| "EOF".into());
            Err(self.error(&format!("Expected [{ch}] but found [{found}]")))
        }
    }

    fn found_text(&self) -> String {
        if self.is_end() {
            "EOF".to_string()
        } else {
            self.text().to_string()
        }
    }

    pub fn diagnostic(&self, message: &str) -> diagnostics::Diagnostic {
        diagnostics::render(
            message,
            &Excerpt {
                source: &self.source,
                line_start: self.line_start,
                offset: self.off,
                line: self.line,
                whitespace_tokens: !self.ignore_whitespace,
            },
        )
    }

    pub fn error_message(&self, message: &str) -> String {
        self.diagnostic(message).rendered
    }

    /// Deferred form of `throw`: build the error without returning early.
    pub fn error(&self, message: &str) -> LexError {
        LexError::Unexpected(self.diagnostic(message))
    }

    pub fn throw<T>(&self, message: &str) -> Result<T, LexError> {
        Err(self.error(message))
    }
}

impl Clone for Lexer {
    fn clone(&self) -> Self {
        self.clone_without_peek()
    }
}

/// Count line breaks in `bytes[from..to]`. A CR followed by LF before `limit`
/// is one break, counted at the LF.
fn count_newlines(
    bytes: &[u8],
    from: usize,
    to: usize,
    limit: usize,
    line: &mut usize,
    line_start: &mut usize,
) {
    for i in from..to {
        let nl = match bytes[i] {
            b'\n' => true,
            b'\r' => i + 1 >= limit || bytes[i + 1] != b'\n',
            _ => false,
        };
        if nl {
            *line += 1;
            *line_start = i + 1;
        }
    }
}

fn run_of(bytes: &[u8], base: usize, end: usize, b: u8) -> usize {
    bytes[base..end].iter().take_while(|&&c| c == b).count()
}
