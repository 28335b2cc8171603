// src/dev/generator.rs
// Random source text exercising every lexer path: identifiers, numbers with
// exponents, quoted strings (some unterminated at the very end), whitespace
// with CR/LF mixes, operators, brackets, comments and non-ASCII symbols.

use rand::Rng;

/// At least `target_len` bytes of random source.
pub fn gen_source<R: Rng>(rng: &mut R, target_len: usize) -> String {
    let mut out = String::with_capacity(target_len + 16);
    while out.len() < target_len {
        match rng.random_range(0u32..100) {
            0..=21 => push_ident(rng, &mut out),
            22..=33 => push_number(rng, &mut out),
            34..=41 => push_string(rng, &mut out),
            42..=59 => push_ws(rng, &mut out),
            60..=64 => push_comment(rng, &mut out),
            65..=89 => push_operator(rng, &mut out),
            90..=96 => push_bracket(rng, &mut out),
            _ => push_unicode(rng, &mut out),
        }
    }
    if rng.random_bool(0.1) {
        // Unterminated literal running into end of input.
        out.push('"');
        push_ident(rng, &mut out);
    }
    out
}

fn pick<R: Rng>(rng: &mut R, set: &str) -> char {
    let bytes = set.as_bytes();
    bytes[rng.random_range(0..bytes.len())] as char
}

fn push_ident<R: Rng>(rng: &mut R, out: &mut String) {
    const FIRST: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ$_";
    const REST: &str = "abcdefghijklmnopqrstuvwxyz0123456789-_";
    out.push(pick(rng, FIRST));
    for _ in 1..rng.random_range(1..=10) {
        out.push(pick(rng, REST));
    }
}

fn push_number<R: Rng>(rng: &mut R, out: &mut String) {
    for _ in 0..rng.random_range(1..=6) {
        out.push(pick(rng, "0123456789"));
    }
    if rng.random_bool(0.3) {
        out.push('.');
        out.push(pick(rng, "0123456789"));
    }
    if rng.random_bool(0.2) {
        out.push(pick(rng, "eE"));
        if rng.random_bool(0.5) {
            out.push(pick(rng, "+-"));
        }
        out.push(pick(rng, "0123456789"));
    }
}

fn push_string<R: Rng>(rng: &mut R, out: &mut String) {
    let quote = pick(rng, "\"'`");
    out.push(quote);
    for _ in 0..rng.random_range(0..=12) {
        out.push(pick(rng, "abc XYZ 019 +-*/ \t"));
    }
    out.push(quote);
}

fn push_ws<R: Rng>(rng: &mut R, out: &mut String) {
    for _ in 0..rng.random_range(1..=4) {
        match rng.random_range(0u32..6) {
            0 | 1 => out.push(' '),
            2 => out.push('\t'),
            3 => out.push('\n'),
            4 => out.push_str("\r\n"),
            _ => out.push('\r'),
        }
    }
}

fn push_comment<R: Rng>(rng: &mut R, out: &mut String) {
    if rng.random_bool(0.5) {
        out.push_str("//");
        for _ in 0..rng.random_range(0..=20) {
            out.push(pick(rng, "abc def 123 */"));
        }
        out.push('\n');
    } else {
        out.push_str("/*");
        for _ in 0..rng.random_range(0..=20) {
            out.push(pick(rng, "abc\n def 123 /"));
        }
        out.push_str("*/");
    }
}

fn push_operator<R: Rng>(rng: &mut R, out: &mut String) {
    const OPS: [&str; 16] = [
        "+", "-", "*", "/", "=", "==", "=>", "<", "</", ">=", "!", "&&", "||", ";", ",", ".",
    ];
    out.push_str(OPS[rng.random_range(0..OPS.len())]);
}

fn push_bracket<R: Rng>(rng: &mut R, out: &mut String) {
    out.push(pick(rng, "()[]{}"));
}

fn push_unicode<R: Rng>(rng: &mut R, out: &mut String) {
    const CHARS: [char; 5] = ['é', 'λ', '→', '漢', '🙂'];
    out.push(CHARS[rng.random_range(0..CHARS.len())]);
}
