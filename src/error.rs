// src/error.rs
use thiserror::Error;

use crate::lexer::diagnostics::Diagnostic;

#[derive(Debug, Clone, Error)]
pub enum LexError {
    /// Lexer input must be valid UTF-8 text.
    #[error("lexer source is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// `sync`/`fence` between lexers that wrap different source strings.
    #[error("cannot {op} lexers that reference different source strings")]
    SourceMismatch { op: &'static str },

    /// An assertion or explicit throw at the lexer's position.
    #[error("{0}")]
    Unexpected(Diagnostic),
}

impl LexError {
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            LexError::Unexpected(d) => Some(d),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// The input does not match the grammar and no recovery applied.
    #[error("{0}")]
    Syntax(Diagnostic),

    #[error(transparent)]
    Lex(#[from] LexError),

    /// A state row produced an action id with no function behind it.
    #[error("invalid action {action} in state {state} (table has {available} actions)")]
    InvalidAction {
        state: u32,
        action: i64,
        available: usize,
    },

    /// The goto row for a state has no entry for the reduced nonterminal.
    #[error("invalid goto: state {state} has no transition for selector {selector}")]
    InvalidGoto { state: u32, selector: u32 },

    /// A reduction popped more frames than the stack holds.
    #[error("reduction of {length} symbols underflows a stack of depth {depth}")]
    StackUnderflow { length: u32, depth: usize },

    /// The step ceiling ran out; this points at broken tables, not bad input.
    #[error("parser exceeded {limit} steps without accepting")]
    StepLimit { limit: u64 },

    /// Accept reached with a value stack that is not exactly one entry.
    #[error("accept reached with {depth} values on the stack")]
    UnbalancedAccept { depth: usize },

    #[error("malformed grammar tables: {0}")]
    Tables(String),

    /// A child parse could not load its source.
    #[error("failed to load `{name}`: {message}")]
    Load { name: String, message: String },

    /// A child parse task panicked or was cancelled.
    #[error("child parse task failed: {0}")]
    Task(String),
}

impl ParseError {
    /// True for failures caused by the grammar tables or engine rather than the input.
    pub fn is_internal(&self) -> bool {
        !matches!(
            self,
            ParseError::Syntax(_) | ParseError::Lex(_) | ParseError::Load { .. }
        )
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            ParseError::Syntax(d) => Some(d),
            ParseError::Lex(e) => e.diagnostic(),
            _ => None,
        }
    }
}
