// src/dev/invariants.rs
// Lexer invariants checked over arbitrary sources: copies lex identically,
// peeking never moves the cursor, line numbers follow newline tokens, and a
// fenced lexer never reads past its fence.

use anyhow::{Result, bail, ensure};
use hashbrown::HashMap;
use rand::Rng;

use crate::lexer::{Lexer, Token, TokenType, tables::WHITESPACE_NEWLINE};

#[derive(Debug, Default, Clone, Copy)]
pub struct Checked {
    pub tokens: usize,
    pub lines: usize,
    pub fences: usize,
}

/// Run every check over `src`; `fences` random fence pairs are tried.
pub fn check_source<R: Rng>(rng: &mut R, src: &str, fences: usize) -> Result<Checked> {
    let stream = walk(Lexer::with_whitespace(src), src)?;
    let mut lines = 0;
    for t in &stream {
        ensure!(
            t.line == lines,
            "token at {} reports line {} but {} newlines precede it",
            t.offset,
            t.line,
            lines
        );
        if t.ty == TokenType::Newline {
            lines += 1;
        }
    }

    // The whitespace-skipping stream is the same tokens minus layout.
    let by_offset: HashMap<usize, Token> = stream.iter().map(|t| (t.offset, *t)).collect();
    let skipped = walk(Lexer::new(src), src)?;
    for t in &skipped {
        ensure!(
            !t.ty.is_any(WHITESPACE_NEWLINE),
            "whitespace token at {} while skipping whitespace",
            t.offset
        );
        match by_offset.get(&t.offset) {
            Some(w) if w == t => {}
            other => bail!("skipping lexer produced {t:?}, whitespace lexer {other:?}"),
        }
    }

    let mut fenced = 0;
    if stream.len() >= 2 {
        for _ in 0..fences {
            let i = rng.random_range(0..stream.len() - 1);
            let j = rng.random_range(i + 1..stream.len());
            check_fence(src, i, j)?;
            fenced += 1;
        }
    }

    Ok(Checked {
        tokens: stream.len(),
        lines,
        fences: fenced,
    })
}

/// Walk `lex` to the end, checking copy and peek behavior at every token.
fn walk(mut lex: Lexer, src: &str) -> Result<Vec<Token>> {
    let mut out = Vec::new();
    let mut last_end = 0;
    while !lex.is_end() {
        let here = lex.token();
        ensure!(here.length > 0, "empty token at {}", here.offset);
        ensure!(here.offset >= last_end, "token at {} overlaps previous", here.offset);
        ensure!(here.end() <= src.len(), "token at {} runs past the input", here.offset);
        ensure!(
            src.is_char_boundary(here.offset) && src.is_char_boundary(here.end()),
            "token at {} splits a character",
            here.offset
        );

        let mut a = lex.copy();
        let mut b = lex.copy();
        a.next();
        b.next();
        ensure!(a.token() == b.token(), "copies disagree after {}", here.offset);
        ensure!(lex.token() == here, "copy mutated the original at {}", here.offset);

        let p1 = lex.peek().token();
        let p2 = lex.peek().token();
        ensure!(p1 == p2, "repeated peek differs at {}", here.offset);
        ensure!(p1 == a.token(), "peek differs from copy+next at {}", here.offset);
        ensure!(lex.token() == here, "peek moved the cursor at {}", here.offset);

        out.push(here);
        last_end = here.end();
        lex.next();
    }
    Ok(out)
}

fn check_fence(src: &str, i: usize, j: usize) -> Result<()> {
    let mut a = Lexer::with_whitespace(src);
    for _ in 0..i {
        a.next();
    }
    let mut b = a.copy();
    for _ in i..j {
        b.next();
    }
    let bound = b.offset();
    a.fence(&b)?;
    let mut steps = 0;
    while !a.is_end() {
        ensure!(
            a.token().end() <= bound,
            "fenced token {:?} passes fence at {bound}",
            a.token()
        );
        a.next();
        steps += 1;
        ensure!(steps <= src.len() + 1, "fenced lexer never reached its end");
    }
    ensure!(a.offset() <= bound, "fenced lexer ended at {} past {bound}", a.offset());
    Ok(())
}
