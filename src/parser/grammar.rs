// src/parser/grammar.rs
// Everything the engine needs to run one language: symbol map, state and goto
// tables, action functions, error handlers and configuration. The engine
// itself is the same for every grammar.

use std::{collections::BTreeMap, fmt, path::Path, sync::Arc};

use anyhow::{Context, Result, bail};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use super::{
    action::{Action, ActionSpec},
    config::GrammarConfig,
    recovery::{ErrorHandler, Recovery, RecoveryContext, default_handler},
    symbols::SymbolMap,
    tables::{ParseTables, Row},
};
use crate::{
    ast::Value,
    env::{Environment, NodeRegistry},
    lexer::{Lexer, TokenType, symbols::SymbolTrie},
};

pub struct Grammar {
    pub symbols: SymbolMap,
    pub tables: ParseTables,
    /// Action id `n` (a positive state-table entry) runs `actions[n - 1]`.
    pub actions: Vec<Action>,
    pub handlers: HashMap<u32, ErrorHandler>,
    pub default_handler: ErrorHandler,
    pub functions: Arc<NodeRegistry>,
    pub config: GrammarConfig,
    trie: Option<Arc<SymbolTrie>>,
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("states", &self.tables.n_states())
            .field("actions", &self.actions.len())
            .field("handlers", &self.handlers.len())
            .field("functions", &self.functions)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Grammar {
    pub fn new(
        symbols: SymbolMap,
        tables: ParseTables,
        actions: Vec<Action>,
        config: GrammarConfig,
    ) -> Self {
        if tables.state.len() != tables.goto.len() && !tables.goto.is_empty() {
            log::warn!(
                "grammar has {} state rows but {} goto rows",
                tables.state.len(),
                tables.goto.len()
            );
        }
        let mut g = Self {
            symbols,
            tables,
            actions,
            handlers: HashMap::new(),
            default_handler: Arc::new(default_handler),
            functions: Arc::default(),
            config,
            trie: None,
        };
        g.rebuild_trie();
        g
    }

    fn rebuild_trie(&mut self) {
        self.trie = None;
        if !self.config.inject_symbols {
            return;
        }
        let custom = self.symbols.custom_symbols();
        if custom.is_empty() {
            return;
        }
        let mut trie = SymbolTrie::new();
        for s in custom {
            trie.insert(s);
        }
        self.trie = Some(Arc::new(trie));
    }

    /// Trie of multi-character symbols injected into every lexer this grammar drives.
    pub fn symbol_trie(&self) -> Option<&Arc<SymbolTrie>> {
        self.trie.as_ref()
    }

    /// Lexer over `source` configured for this grammar.
    pub fn lexer(&self, source: &str) -> Lexer {
        let mut lex = if self.config.ignore_whitespace {
            Lexer::new(source)
        } else {
            Lexer::with_whitespace(source)
        };
        self.prepare(&mut lex);
        lex
    }

    /// Apply this grammar's lexing flags and symbols to an existing lexer and
    /// re-lex its current token.
    pub fn prepare(&self, lex: &mut Lexer) {
        lex.set_ignore_whitespace(self.config.ignore_whitespace);
        lex.set_parse_string(self.config.parse_string);
        if let Some(trie) = &self.trie {
            lex.set_symbols(Arc::clone(trie));
        }
        if self.config.extended_identifiers {
            lex.use_extended_id();
        } else {
            lex.rescan();
        }
    }

    /// Handler for `state`, falling back to the default handler.
    pub fn handler(&self, state: u32) -> &ErrorHandler {
        self.handlers.get(&state).unwrap_or(&self.default_handler)
    }

    pub fn with_handler(
        mut self,
        state: u32,
        f: impl Fn(&mut RecoveryContext<'_>) -> Recovery + Send + Sync + 'static,
    ) -> Self {
        self.handlers.insert(state, Arc::new(f));
        self
    }

    pub fn with_default_handler(
        mut self,
        f: impl Fn(&mut RecoveryContext<'_>) -> Recovery + Send + Sync + 'static,
    ) -> Self {
        self.default_handler = Arc::new(f);
        self
    }

    pub fn with_function(
        mut self,
        name: impl Into<String>,
        f: impl Fn(Vec<Value>, &mut Environment, &Lexer) -> Value + Send + Sync + 'static,
    ) -> Self {
        Arc::make_mut(&mut self.functions).register(name, f);
        self
    }

    pub fn with_functions(mut self, functions: Arc<NodeRegistry>) -> Self {
        self.functions = functions;
        self
    }

    /// Replace the tables, e.g. with the compact binary form of the same grammar.
    pub fn with_tables(mut self, tables: ParseTables) -> Self {
        self.tables = tables;
        self
    }

    pub fn with_config(mut self, config: GrammarConfig) -> Self {
        self.config = config;
        self.rebuild_trie();
        self
    }

    pub fn from_json_bytes(data: &[u8]) -> Result<Self> {
        let file: GrammarFile =
            serde_json::from_slice(data).context("failed to parse grammar JSON")?;
        file.into_grammar()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data =
            std::fs::read(path).with_context(|| format!("reading grammar {}", path.display()))?;
        Self::from_json_bytes(&data).with_context(|| format!("loading {}", path.display()))
    }
}

/// On-disk form of a grammar: configuration, symbol map, tables and action specs.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrammarFile {
    #[serde(default)]
    pub config: GrammarConfig,
    /// Token text -> terminal id.
    #[serde(default)]
    pub symbols: BTreeMap<String, u32>,
    /// Token type (name or bit value) -> terminal id.
    #[serde_as(as = "BTreeMap<DisplayFromStr, _>")]
    #[serde(default)]
    pub types: BTreeMap<TokenType, u32>,
    pub state: Vec<Row>,
    #[serde(default)]
    pub goto: Vec<Row>,
    pub actions: Vec<ActionSpec>,
}

impl GrammarFile {
    pub fn tables(&self) -> ParseTables {
        ParseTables::new(self.state.clone(), self.goto.clone())
    }

    pub fn into_grammar(self) -> Result<Grammar> {
        if self.state.is_empty() {
            bail!("grammar has no states");
        }
        let n_actions = self.actions.len() as i64;
        for (s, row) in self.state.iter().enumerate() {
            if let Some(bad) = row.0.iter().skip(usize::from(row.is_dense())).find(|&&a| a > n_actions) {
                bail!("state {s} references action {bad}, but only {n_actions} are defined");
            }
        }

        let mut symbols = SymbolMap::new();
        for (text, t) in self.symbols {
            symbols.insert_text(text, t);
        }
        for (ty, t) in self.types {
            symbols.insert_type(ty, t);
        }
        let actions = self.actions.iter().map(ActionSpec::compile).collect();
        let tables = ParseTables::new(self.state, self.goto);
        Ok(Grammar::new(symbols, tables, actions, self.config))
    }
}
