// src/main.rs
// Parse a file with a JSON grammar and print the resulting tree.
// Usage:
//   wick-parse [grammar.json] [source-file]
// Defaults to grammars/statements.json and a built-in sample.

use std::{env, fs, path::PathBuf};

use anyhow::{Context, Result};
use wick_parse::{Grammar, ParseError, parse};

const SAMPLE: &str = "let x = 1\nlet y = 2; // trailing comment\nlet z = 3";

fn main() -> Result<()> {
    env_logger::init();
    let mut args = env::args().skip(1);
    let grammar_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("grammars/statements.json"));
    let source = match args.next() {
        Some(p) => fs::read_to_string(&p).with_context(|| format!("read {p}"))?,
        None => SAMPLE.to_string(),
    };

    let grammar = Grammar::load(&grammar_path)?;
    let config = grammar.config.clone().with_env_overrides();
    let grammar = grammar.with_config(config);

    match parse(&source, &grammar) {
        Ok(parsed) => {
            println!("{}", parsed.ast.to_sexpr(&parsed.root));
            for step in &parsed.trace {
                println!("  {step:?}");
            }
            Ok(())
        }
        Err(ParseError::Syntax(d)) => {
            eprintln!("{d}");
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
