// src/bin/gen_tables.rs
// Convert grammar tables between the JSON grammar file and the compact binary form.
// Usage:
//   cargo run --bin gen_tables -- grammars/statements.json            # writes grammars/statements.bin
//   cargo run --bin gen_tables -- grammars/statements.json out.bin
//   cargo run --bin gen_tables -- --to-json tables.bin tables.json     # tables only

use std::{
    env,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use wick_parse::parser::{
    GrammarFile,
    ParseTables,
    tables::{load_tables_bin_bytes, save_tables_bin, save_tables_json},
};

fn stats(t: &ParseTables) -> (usize, usize, usize) {
    let dense = t.state.iter().chain(&t.goto).filter(|r| r.is_dense()).count();
    let entries = t.state.iter().chain(&t.goto).map(|r| r.0.len()).sum();
    (t.n_states(), dense, entries)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    Ok(())
}

fn to_bin(input: &Path, out: &Path) -> Result<()> {
    let data = fs::read(input).with_context(|| format!("read {}", input.display()))?;
    let file: GrammarFile = serde_json::from_slice(&data)
        .with_context(|| format!("parse grammar {}", input.display()))?;
    let tables = file.tables();
    let (states, dense, entries) = stats(&tables);
    println!("[gen_tables] {states} states, {dense} dense rows, {entries} encoded entries");

    ensure_parent(out)?;
    save_tables_bin(out, &tables)?;

    // Re-read and compare every decoded slot the grammar can address.
    let back = load_tables_bin_bytes(&fs::read(out)?)?;
    let width = (file.symbols.values().chain(file.types.values()).max().copied().unwrap_or(0)
        + 1)
    .max(file.config.eof_terminal + 1);
    for s in 0..states as u32 {
        for t in 0..width {
            if tables.action(s, t) != back.action(s, t) {
                bail!("round trip mismatch at state {s}, terminal {t}");
            }
        }
    }
    println!("[gen_tables] wrote {}", out.display());
    Ok(())
}

fn to_json(input: &Path, out: &Path) -> Result<()> {
    let data = fs::read(input).with_context(|| format!("read {}", input.display()))?;
    let tables = load_tables_bin_bytes(&data)?;
    ensure_parent(out)?;
    save_tables_json(out, &tables)?;
    println!("[gen_tables] wrote {}", out.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args: Vec<String> = env::args().skip(1).collect();
    match args.as_slice() {
        [flag, input, out] if flag == "--to-json" => to_json(Path::new(input), Path::new(out)),
        [input] => {
            let out = PathBuf::from(input).with_extension("bin");
            to_bin(Path::new(input), &out)
        }
        [input, out] => to_bin(Path::new(input), Path::new(out)),
        _ => bail!("usage: gen_tables <grammar.json> [out.bin] | --to-json <tables.bin> <out.json>"),
    }
}
