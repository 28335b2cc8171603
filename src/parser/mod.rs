// src/parser/mod.rs
pub mod action;
pub mod config;
pub mod engine;
pub mod grammar;
pub mod recovery;
pub mod symbols;
pub mod tables;

use std::{future::Future, pin::Pin, sync::Arc};

use rayon::prelude::*;
use tokio::task::JoinSet;

pub use action::{Action, ActionContext, ActionResult, ActionSpec};
pub use config::GrammarConfig;
pub use engine::TraceStep;
pub use grammar::{Grammar, GrammarFile};
pub use recovery::{ErrorHandler, Recovery, RecoveryContext};
pub use symbols::SymbolMap;
pub use tables::{ParseTables, Row, lsm};

use crate::{
    ast::{Ast, Value},
    env::{ChildRequest, Environment},
    error::ParseError,
};

/// Result of one synchronous parse. Child parses requested by actions are
/// still pending; `resolve` runs them.
#[derive(Debug)]
pub struct Parsed {
    pub root: Value,
    pub ast: Ast,
    pub presets: Vec<serde_json::Value>,
    pub children: Vec<ChildRequest>,
    pub trace: Vec<TraceStep>,
}

/// A parse together with all of its transitively resolved children.
#[derive(Debug)]
pub struct Resolved {
    /// Name the parent gave this child; `None` for the top-level document.
    pub name: Option<String>,
    pub root: Value,
    pub ast: Ast,
    pub children: Vec<Resolved>,
}

impl Resolved {
    /// Number of documents in this tree, itself included.
    pub fn documents(&self) -> usize {
        1 + self.children.iter().map(Resolved::documents).sum::<usize>()
    }

    pub fn find(&self, name: &str) -> Option<&Resolved> {
        if self.name.as_deref() == Some(name) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }
}

pub type ResolveFuture = Pin<Box<dyn Future<Output = Result<Resolved, ParseError>> + Send>>;

impl Parsed {
    pub fn pending(&self) -> usize {
        self.children.len()
    }

    /// Load and parse every child concurrently, each with a fresh environment
    /// carrying this parse's presets, then resolve their children in turn.
    /// Completes once the whole tree has; the first failure cancels the rest.
    pub fn resolve(self, grammar: Arc<Grammar>) -> ResolveFuture {
        resolve_tree(None, self, grammar)
    }
}

fn resolve_tree(name: Option<String>, parsed: Parsed, grammar: Arc<Grammar>) -> ResolveFuture {
    Box::pin(async move {
        let Parsed {
            root,
            ast,
            presets,
            children,
            ..
        } = parsed;

        let n = children.len();
        let mut set = JoinSet::new();
        for (index, child) in children.into_iter().enumerate() {
            let grammar = child.grammar.unwrap_or_else(|| Arc::clone(&grammar));
            let presets = presets.clone();
            let name = child.name;
            let source = child.source;
            set.spawn(async move {
                let text = source.await.map_err(|e| ParseError::Load {
                    name: name.clone(),
                    message: format!("{e:#}"),
                })?;
                log::debug!("parsing child `{name}` ({} bytes)", text.len());

                let g = Arc::clone(&grammar);
                let parsed = tokio::task::spawn_blocking(move || {
                    let mut env = Environment::for_grammar(&g);
                    env.presets = presets;
                    parse_with_env(&text, &g, env)
                })
                .await
                .map_err(|e| ParseError::Task(e.to_string()))??;

                let resolved = resolve_tree(Some(name), parsed, grammar).await?;
                Ok::<_, ParseError>((index, resolved))
            });
        }

        let mut slots: Vec<Option<Resolved>> = (0..n).map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            let (index, r) = joined.map_err(|e| ParseError::Task(e.to_string()))??;
            slots[index] = Some(r);
        }

        Ok(Resolved {
            name,
            root,
            ast,
            children: slots.into_iter().flatten().collect(),
        })
    })
}

/// Parse `source` with a fresh environment.
pub fn parse(source: &str, grammar: &Grammar) -> Result<Parsed, ParseError> {
    parse_with_env(source, grammar, Environment::for_grammar(grammar))
}

/// Parse with a caller-supplied environment (presets, builders, ASI flag).
pub fn parse_with_env(
    source: &str,
    grammar: &Grammar,
    env: Environment,
) -> Result<Parsed, ParseError> {
    run_parse(source, grammar, env, grammar.config.trace)
}

/// Parse and record every automaton step.
pub fn parse_traced(source: &str, grammar: &Grammar) -> Result<Parsed, ParseError> {
    run_parse(source, grammar, Environment::for_grammar(grammar), true)
}

fn run_parse(
    source: &str,
    grammar: &Grammar,
    mut env: Environment,
    tracing: bool,
) -> Result<Parsed, ParseError> {
    let mut lexer = grammar.lexer(source);
    let mut trace = Vec::new();
    let root = engine::run(
        grammar,
        &mut lexer,
        &mut env,
        tracing.then_some(&mut trace),
    )?;
    Ok(Parsed {
        root,
        presets: std::mem::take(&mut env.presets),
        children: env.take_children(),
        ast: env.ast,
        trace,
    })
}

/// Parse independent sources in parallel; results keep the input order.
pub fn parse_batch<S>(sources: &[S], grammar: &Grammar) -> Vec<Result<Parsed, ParseError>>
where
    S: AsRef<str> + Sync,
{
    sources
        .par_iter()
        .map(|s| parse(s.as_ref(), grammar))
        .collect()
}
