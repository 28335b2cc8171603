// src/parser/config.rs
// Grammar-specific constants. Terminal ids differ for every generated table,
// so the engine reads them from here instead of hard coding them.

use serde::{Deserialize, Serialize};

/// Iteration ceiling for one parse; only reached with broken tables.
pub const DEFAULT_MAX_STEPS: u64 = 10_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarConfig {
    /// Terminal id reported at end of input.
    pub eof_terminal: u32,
    /// Generic id the symbol map gives tokens matched by the custom trie;
    /// recovery re-derives the specific id from the token text.
    pub symbol_terminal: Option<u32>,
    /// Terminal substituted once per stretch of progress before the
    /// per-state handler runs.
    pub error_terminal: Option<u32>,
    /// Statement terminator the default handler synthesizes.
    pub asi_terminal: Option<u32>,
    pub ignore_whitespace: bool,
    pub parse_string: bool,
    pub extended_identifiers: bool,
    /// Seed the lexer's symbol trie from the multi-character entries of the
    /// symbol map.
    pub inject_symbols: bool,
    pub max_steps: u64,
    /// Record a step trace for every parse.
    pub trace: bool,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            eof_terminal: 0,
            symbol_terminal: None,
            error_terminal: None,
            asi_terminal: None,
            ignore_whitespace: true,
            parse_string: false,
            extended_identifiers: false,
            inject_symbols: true,
            max_steps: DEFAULT_MAX_STEPS,
            trace: false,
        }
    }
}

impl GrammarConfig {
    /// Apply `WICK_MAX_STEPS`, `WICK_IGNORE_WHITESPACE` and `WICK_TRACE`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(n) = std::env::var("WICK_MAX_STEPS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            self.max_steps = n;
        }
        self.ignore_whitespace = env_flag_true("WICK_IGNORE_WHITESPACE", self.ignore_whitespace);
        self.trace = env_flag_true("WICK_TRACE", self.trace);
        self
    }
}

/// Treat any value other than "0"/"false" (case-insensitive) as true.
pub fn env_flag_true(var: &str, default: bool) -> bool {
    std::env::var(var)
        .map(|v| !(v == "0" || v.eq_ignore_ascii_case("false")))
        .unwrap_or(default)
}
