// src/lexer/diagnostics.rs
// Positioned error messages with a source excerpt:
//
//   Unexpected token [}] at 3:7
//   ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//       3: let a }
//   ────────────────⮉
//   ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::fmt;

const ARROW: char = '\u{2b89}';
const THIN_RULE: char = '\u{2500}';
const THICK_RULE: char = '\u{2501}';
const RULE_EXTRA: usize = 48;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    /// 1-based line.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
    pub rendered: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

/// Inputs needed to render one diagnostic.
pub(crate) struct Excerpt<'a> {
    pub source: &'a str,
    pub line_start: usize,
    pub offset: usize,
    /// 0-based line of `offset`.
    pub line: usize,
    pub whitespace_tokens: bool,
}

pub(crate) fn render(message: &str, ex: &Excerpt<'_>) -> Diagnostic {
    let src = ex.source;
    let line_start = ex.line_start.min(src.len());
    let line_end = src[line_start..]
        .find(['\n', '\r'])
        .map(|i| line_start + i)
        .unwrap_or(src.len());

    let upto = ex.offset.clamp(line_start, line_end);
    let before = &src[line_start..upto];
    let column = before.chars().count();
    let tabs = before.chars().filter(|&c| c == '\t').count();

    let gutter = format!("    {}: ", ex.line + 1);
    let gutter_width = gutter.chars().count();
    let thick: String = std::iter::repeat_n(THICK_RULE, gutter_width + RULE_EXTRA).collect();
    let mut caret: String = std::iter::repeat_n(THIN_RULE, gutter_width + column + tabs).collect();
    caret.push(ARROW);

    let line_text = src[line_start..line_end].replace('\t', "  ");
    let warning = if ex.whitespace_tokens {
        "\n The Lexer produced whitespace tokens"
    } else {
        ""
    };

    let rendered = format!(
        "{message} at {}:{}\n{thick}\n{gutter}{line_text}\n{caret}\n{thick}{warning}",
        ex.line + 1,
        column + 1,
    );

    Diagnostic {
        message: message.to_string(),
        line: ex.line + 1,
        column: column + 1,
        rendered,
    }
}
