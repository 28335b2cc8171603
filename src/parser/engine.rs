// src/parser/engine.rs
// Table-driven shift-reduce interpreter. Every grammar runs through `run`;
// only the data in `Grammar` changes.

use super::{
    action::{ActionContext, ActionResult},
    grammar::Grammar,
    recovery::{Recovery, RecoveryContext},
};
use crate::{
    ast::Value,
    env::Environment,
    error::ParseError,
    lexer::{Lexer, TokenType},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frame {
    offset: usize,
    state: u32,
}

/// One automaton step, recorded when tracing is on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceStep {
    Shift { state: u32, text: String },
    Reduce { length: u32, goto: u32, state: u32, values: usize },
    Accept,
    Ignore { text: String },
    Recover { state: u32, from: u32, to: u32 },
}

/// Recovery strategies already tried on the current real token.
#[derive(Debug, Default, Clone, Copy)]
struct Attempts {
    rederived: bool,
    backed_off: bool,
    probed: bool,
}

/// Substitutions allowed between two shifts: the forced error terminal, then
/// the handler's.
const HANDLER_SUBSTITUTED: u8 = 2;

/// Drive `lexer` through `grammar` until accept or an unrecoverable error.
/// The lexer must already be prepared for the grammar (see `Grammar::lexer`).
pub fn run(
    grammar: &Grammar,
    lexer: &mut Lexer,
    env: &mut Environment,
    mut trace: Option<&mut Vec<TraceStep>>,
) -> Result<Value, ParseError> {
    let cfg = &grammar.config;
    let tables = &grammar.tables;
    let classify = |lex: &Lexer| grammar.symbols.classify(lex, cfg);

    let mut frames = vec![Frame { offset: 0, state: 0 }];
    let mut values: Vec<Value> = Vec::new();
    let mut prev = lexer.copy();
    let mut tk = classify(lexer);
    let mut virtual_token = false;
    let mut substitutions = 0u8;
    let mut attempts = Attempts::default();

    let mut record = |step: TraceStep| {
        if let Some(t) = trace.as_deref_mut() {
            t.push(step);
        }
    };

    for _ in 0..cfg.max_steps {
        let state = frames.last().map_or(0, |f| f.state);
        let action = tables.action(state, tk);

        let result = if action == 0 {
            log::trace!("state {state}: ignoring [{}]", lexer.text());
            record(TraceStep::Ignore {
                text: lexer.text().to_string(),
            });
            if !virtual_token {
                prev = lexer.copy();
                lexer.next();
            }
            tk = classify(lexer);
            virtual_token = false;
            attempts = Attempts::default();
            continue;
        } else if action > 0 {
            let f = grammar
                .actions
                .get((action - 1) as usize)
                .ok_or(ParseError::InvalidAction {
                    state,
                    action,
                    available: grammar.actions.len(),
                })?;
            let mut cx = ActionContext {
                terminal: tk,
                env: &mut *env,
                values: &mut values,
                lexer: &*lexer,
                state,
            };
            f.call(&mut cx)
        } else {
            ActionResult::Error
        };

        match result {
            ActionResult::Shift(target) => {
                log::trace!("state {state}: shift [{}] -> {target}", lexer.text());
                let text = if virtual_token {
                    String::new()
                } else {
                    lexer.text().to_string()
                };
                record(TraceStep::Shift {
                    state: target,
                    text: text.clone(),
                });
                values.push(Value::Text(text));
                frames.push(Frame {
                    offset: lexer.offset(),
                    state: target,
                });
                if !virtual_token {
                    prev = lexer.copy();
                    lexer.next();
                }
                virtual_token = false;
                substitutions = 0;
                attempts = Attempts::default();
                tk = classify(lexer);
            }
            ActionResult::Reduce { length, goto } => {
                let depth = frames.len();
                if length as usize >= depth {
                    return Err(ParseError::StackUnderflow { length, depth });
                }
                let keep = depth - length as usize;
                // The reduced frame starts where its first popped frame did.
                let start = frames.get(keep).map_or(lexer.offset(), |f| f.offset);
                frames.truncate(keep);
                let top = frames.last().map_or(0, |f| f.state);
                let next = tables.goto(top, goto);
                if next < 0 {
                    return Err(ParseError::InvalidGoto {
                        state: top,
                        selector: goto,
                    });
                }
                log::trace!("state {state}: reduce {length} via {goto} -> {next}");
                record(TraceStep::Reduce {
                    length,
                    goto,
                    state: next as u32,
                    values: values.len(),
                });
                frames.push(Frame {
                    offset: start,
                    state: next as u32,
                });
            }
            ActionResult::Accept => {
                log::trace!("state {state}: accept");
                record(TraceStep::Accept);
                if values.len() != 1 {
                    return Err(ParseError::UnbalancedAccept {
                        depth: values.len(),
                    });
                }
                return Ok(values.pop().unwrap_or_default());
            }
            ActionResult::Error => {
                let from = tk;
                let recovered = recover(
                    grammar,
                    lexer,
                    env,
                    &mut values,
                    &prev,
                    state,
                    &mut tk,
                    &mut virtual_token,
                    &mut substitutions,
                    &mut attempts,
                );
                if !recovered {
                    return Err(unexpected(lexer));
                }
                log::debug!("state {state}: recovered terminal {from} -> {tk}");
                record(TraceStep::Recover { state, from, to: tk });
            }
        }
    }

    Err(ParseError::StepLimit {
        limit: cfg.max_steps,
    })
}

/// Pick a terminal to retry with; false when the token is a syntax error.
#[allow(clippy::too_many_arguments)]
fn recover(
    grammar: &Grammar,
    lexer: &mut Lexer,
    env: &mut Environment,
    values: &mut Vec<Value>,
    prev: &Lexer,
    state: u32,
    tk: &mut u32,
    virtual_token: &mut bool,
    substitutions: &mut u8,
    attempts: &mut Attempts,
) -> bool {
    let cfg = &grammar.config;
    let symbols = &grammar.symbols;

    // Generic custom-symbol id: look up the specific terminal for the text.
    if !attempts.rederived && !*virtual_token && cfg.symbol_terminal == Some(*tk) {
        attempts.rederived = true;
        if let Some(t) = symbols.by_text(lexer.text()).filter(|&t| t != *tk) {
            *tk = t;
            return true;
        }
    }

    // A greedy multi-character operator may be longer than the grammar allows.
    if !attempts.backed_off
        && !*virtual_token
        && lexer.ty().is_any(TokenType::Operator.bits() | TokenType::Symbol.bits())
        && lexer.len() > 1
    {
        attempts.backed_off = true;
        let before = lexer.len();
        lexer.rescan_plain();
        if lexer.len() < before {
            *tk = symbols.classify(lexer, cfg);
            return true;
        }
    }

    if !lexer.is_end() && !*virtual_token {
        if !attempts.probed {
            attempts.probed = true;
            if let Some(t) = symbols.by_type(lexer.ty()).filter(|&t| t != *tk) {
                *tk = t;
                return true;
            }
        }
        match cfg.error_terminal {
            Some(e) if *substitutions == 0 && *tk != e => {
                *substitutions = 1;
                *virtual_token = true;
                *tk = e;
                return true;
            }
            _ => {}
        }
    }

    *tk = symbols.classify(lexer, cfg);
    *virtual_token = false;
    if *substitutions >= HANDLER_SUBSTITUTED {
        return false;
    }

    let handler = grammar.handler(state);
    let before = lexer.offset();
    let outcome = {
        let mut cx = RecoveryContext {
            terminal: *tk,
            env: &mut *env,
            values: &mut *values,
            lexer: &mut *lexer,
            prev,
            state,
            grammar,
        };
        handler(&mut cx)
    };
    match outcome {
        Recovery::Substitute(t) => {
            *substitutions = HANDLER_SUBSTITUTED;
            *virtual_token = true;
            *tk = t;
            true
        }
        Recovery::Resume(t) if lexer.offset() > before => {
            *attempts = Attempts::default();
            *tk = t;
            true
        }
        Recovery::Resume(_) | Recovery::Fail => false,
    }
}

fn unexpected(lexer: &Lexer) -> ParseError {
    let message = if lexer.is_end() {
        "Unexpected end of input".to_string()
    } else {
        format!("Unexpected token [{}]", lexer.text())
    };
    ParseError::Syntax(lexer.diagnostic(&message))
}
