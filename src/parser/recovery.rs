// src/parser/recovery.rs
// Per-state error handlers, run by the engine once its built-in recovery
// strategies have not produced an action for the current token.

use std::sync::Arc;

use super::{config::GrammarConfig, grammar::Grammar};
use crate::{
    ast::Value,
    env::Environment,
    lexer::{Lexer, TokenType},
};

/// What the engine should do after a handler ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Retry as if this terminal had been read. The lexer is not advanced;
    /// the synthesized token consumes no input.
    Substitute(u32),
    /// The handler moved the lexer; retry with this terminal for the new token.
    Resume(u32),
    /// Unrecoverable at this position.
    Fail,
}

pub type ErrorHandler = Arc<dyn Fn(&mut RecoveryContext<'_>) -> Recovery + Send + Sync>;

pub struct RecoveryContext<'a> {
    pub terminal: u32,
    pub env: &'a mut Environment,
    pub values: &'a mut Vec<Value>,
    pub lexer: &'a mut Lexer,
    /// Lexer as it was on the most recently shifted token.
    pub prev: &'a Lexer,
    pub state: u32,
    pub grammar: &'a Grammar,
}

impl RecoveryContext<'_> {
    /// Terminal id of an arbitrary lexer position.
    pub fn classify(&self, lexer: &Lexer) -> u32 {
        self.grammar.symbols.classify(lexer, &self.grammar.config)
    }

    /// True when the current state has an action for `terminal`.
    pub fn accepts(&self, terminal: u32) -> bool {
        self.grammar.tables.accepts(self.state, terminal)
    }

    pub fn config(&self) -> &GrammarConfig {
        &self.grammar.config
    }
}

/// Skips `//` and `/* */` comments, then inserts the configured statement
/// terminator at a newline, `}`, `</` or end-of-input boundary.
pub fn default_handler(cx: &mut RecoveryContext<'_>) -> Recovery {
    if let Some(end) = comment_end(&*cx.lexer) {
        log::debug!("skipping comment at {}..{}", cx.lexer.offset(), end);
        cx.lexer.jump_to(end);
        let t = cx.classify(&*cx.lexer);
        return Recovery::Resume(t);
    }

    let Some(asi) = cx.config().asi_terminal else {
        return Recovery::Fail;
    };
    if cx.env.asi && cx.accepts(asi) && at_statement_boundary(&*cx.lexer, cx.prev) {
        log::debug!(
            "inserting terminator {asi} in state {} at {}:{}",
            cx.state,
            cx.lexer.line() + 1,
            cx.lexer.column() + 1
        );
        return Recovery::Substitute(asi);
    }

    Recovery::Fail
}

/// Byte offset just past the comment starting at the current token, if any.
/// A line comment stops before its newline.
fn comment_end(lexer: &Lexer) -> Option<usize> {
    if lexer.is_end() {
        return None;
    }
    let source = lexer.source();
    let start = lexer.offset();
    let rest = &source[start..lexer.string_length()];
    if let Some(body) = rest.strip_prefix("//") {
        let n = body.find(['\n', '\r']).unwrap_or(body.len());
        Some(start + 2 + n)
    } else if let Some(body) = rest.strip_prefix("/*") {
        let n = body.find("*/").map_or(body.len(), |i| i + 2);
        Some(start + 2 + n)
    } else {
        None
    }
}

fn at_statement_boundary(lexer: &Lexer, prev: &Lexer) -> bool {
    if lexer.text() == ")" {
        return false;
    }
    if lexer.is_end() || lexer.text() == "}" || lexer.ty() == TokenType::Newline {
        return true;
    }
    let source = lexer.source();
    if source[lexer.offset()..lexer.string_length()].starts_with("</") {
        return true;
    }
    let gap_start = (prev.offset() + prev.len()).min(lexer.offset());
    source[gap_start..lexer.offset()].contains(['\n', '\r'])
}
