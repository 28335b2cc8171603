// src/lexer/tables/mod.rs
pub mod chars;
pub mod tokens;

pub use chars::{CharClass, IdTable};
pub use tokens::{Token, TokenType, WHITESPACE_NEWLINE};
