// src/lexer/mod.rs
pub mod cursor;
pub mod diagnostics;
pub mod symbols;
pub mod tables;

pub use cursor::Lexer;
pub use diagnostics::Diagnostic;
pub use tables::{Token, TokenType};

/// Collect every token of `source` (whitespace skipped).
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut lex = Lexer::new(source);
    let mut out = Vec::new();
    while !lex.is_end() {
        out.push(lex.token());
        lex.next();
    }
    out
}
