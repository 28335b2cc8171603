// src/env.rs
// Per-parse mutable state threaded through every action: the ASI switch,
// the presets stack, the node-builder registry, the AST arena and the child
// parses requested while building it.

use std::{fmt, future::Future, pin::Pin, sync::Arc};

use hashbrown::HashMap;

use crate::{
    ast::{Ast, Span, Value},
    lexer::Lexer,
    parser::grammar::Grammar,
};

/// Builds a semantic value from the popped right-hand side of a production.
pub type NodeBuilder = Arc<dyn Fn(Vec<Value>, &mut Environment, &Lexer) -> Value + Send + Sync>;

/// Yields the source text of a child document.
pub type SourceFuture = Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send>>;

/// Named node builders (`fn.<Kind>`).
#[derive(Clone, Default)]
pub struct NodeRegistry {
    builders: HashMap<String, NodeBuilder>,
}

impl fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.builders.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("NodeRegistry").field("builders", &names).finish()
    }
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(Vec<Value>, &mut Environment, &Lexer) -> Value + Send + Sync + 'static,
    ) -> &mut Self {
        self.builders.insert(name.into(), Arc::new(f));
        self
    }

    pub fn get(&self, name: &str) -> Option<&NodeBuilder> {
        self.builders.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}

/// A child document to parse once the current parse has finished.
pub struct ChildRequest {
    pub name: String,
    /// Grammar for the child; the parent's when `None`.
    pub grammar: Option<Arc<Grammar>>,
    pub source: SourceFuture,
}

impl fmt::Debug for ChildRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildRequest")
            .field("name", &self.name)
            .field("own_grammar", &self.grammar.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct Environment {
    /// Automatic statement-terminator insertion; toggled by instruction actions.
    pub asi: bool,
    pub presets: Vec<serde_json::Value>,
    pub functions: Arc<NodeRegistry>,
    pub ast: Ast,
    children: Vec<ChildRequest>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(Arc::default())
    }
}

impl Environment {
    pub fn new(functions: Arc<NodeRegistry>) -> Self {
        Self {
            asi: true,
            presets: Vec::new(),
            functions,
            ast: Ast::new(),
            children: Vec::new(),
        }
    }

    /// Fresh environment using the grammar's node builders.
    pub fn for_grammar(grammar: &Grammar) -> Self {
        Self::new(Arc::clone(&grammar.functions))
    }

    pub fn push_preset(&mut self, preset: serde_json::Value) {
        self.presets.push(preset);
    }

    pub fn pop_preset(&mut self) -> Option<serde_json::Value> {
        self.presets.pop()
    }

    /// Innermost preset.
    pub fn preset(&self) -> Option<&serde_json::Value> {
        self.presets.last()
    }

    /// Build a `kind` value from `values`: the registered builder if there is
    /// one, otherwise a plain AST node positioned at the lexer.
    pub fn build(&mut self, kind: &str, values: Vec<Value>, lexer: &Lexer) -> Value {
        if let Some(builder) = self.functions.get(kind).cloned() {
            return builder(values, self, lexer);
        }
        let span = Span {
            offset: lexer.offset(),
            line: lexer.line(),
            column: lexer.column(),
        };
        Value::Node(self.ast.push(kind, values, span))
    }

    /// Queue a child parse with the parent's grammar.
    pub fn spawn_child(&mut self, name: impl Into<String>, source: SourceFuture) {
        self.children.push(ChildRequest {
            name: name.into(),
            grammar: None,
            source,
        });
    }

    /// Queue a child parse with its own grammar.
    pub fn spawn_child_with(
        &mut self,
        name: impl Into<String>,
        grammar: Arc<Grammar>,
        source: SourceFuture,
    ) {
        self.children.push(ChildRequest {
            name: name.into(),
            grammar: Some(grammar),
            source,
        });
    }

    /// Number of child parses not yet handed off for resolution.
    pub fn pending(&self) -> usize {
        self.children.len()
    }

    pub(crate) fn take_children(&mut self) -> Vec<ChildRequest> {
        std::mem::take(&mut self.children)
    }
}
