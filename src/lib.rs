// src/lib.rs
//! Cursor lexer and table-driven shift-reduce parser.
//!
//! A [`Grammar`] bundles a symbol map, state and goto tables, action
//! functions and error handlers; [`parse`] runs any grammar through the same
//! engine and returns the root value plus the AST arena it was built in.

pub mod ast;
pub mod dev;
pub mod env;
pub mod error;
pub mod lexer;
pub mod parser;

pub use ast::{Ast, AstNode, NodeId, Span, Value};
pub use env::{Environment, NodeRegistry};
pub use error::{LexError, ParseError};
pub use lexer::{Diagnostic, Lexer, Token, TokenType};
pub use parser::{
    Grammar,
    GrammarConfig,
    Parsed,
    Resolved,
    parse,
    parse_batch,
    parse_traced,
    parse_with_env,
};
