// src/ast.rs
// Arena-backed syntax tree built by reduction actions. Nodes refer to each
// other by `NodeId`, so parent links and in-place replacement need no
// shared ownership.

use std::fmt::Write as _;

/// Entry of the parser's value stack.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    /// Text of a shifted token (empty for a synthesized token).
    Text(String),
    Node(NodeId),
    List(Vec<Value>),
    #[default]
    Empty,
}

impl Value {
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Value::Node(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Source position of the token that completed a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstNode {
    pub kind: String,
    pub children: Vec<Value>,
    pub parent: Option<NodeId>,
    pub span: Span,
}

#[derive(Debug, Clone, Default)]
pub struct Ast {
    nodes: Vec<AstNode>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a node and adopt every node found among `children`.
    pub fn push(&mut self, kind: &str, children: Vec<Value>, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        for child in &children {
            self.adopt(child, Some(id));
        }
        self.nodes.push(AstNode {
            kind: kind.to_string(),
            children,
            parent: None,
            span,
        });
        id
    }

    fn adopt(&mut self, value: &Value, parent: Option<NodeId>) {
        match value {
            Value::Node(c) => {
                if let Some(n) = self.nodes.get_mut(c.0 as usize) {
                    n.parent = parent;
                }
            }
            Value::List(items) => {
                for v in items {
                    self.adopt(v, parent);
                }
            }
            Value::Text(_) | Value::Empty => {}
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&AstNode> {
        self.nodes.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut AstNode> {
        self.nodes.get_mut(id.0 as usize)
    }

    pub fn kind(&self, id: NodeId) -> Option<&str> {
        self.get(id).map(|n| n.kind.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Child nodes of `id` in order, flattening lists and skipping text.
    pub fn child_nodes(&self, id: NodeId) -> Vec<NodeId> {
        fn walk(v: &Value, out: &mut Vec<NodeId>) {
            match v {
                Value::Node(c) => out.push(*c),
                Value::List(items) => items.iter().for_each(|i| walk(i, out)),
                _ => {}
            }
        }
        let mut out = Vec::new();
        if let Some(n) = self.get(id) {
            n.children.iter().for_each(|c| walk(c, &mut out));
        }
        out
    }

    /// Put `new` in the slot `old` occupies under its parent. `old` becomes
    /// detached; returns false if `old` has no parent slot referencing it.
    pub fn replace_node(&mut self, old: NodeId, new: NodeId) -> bool {
        let Some(parent) = self.parent(old) else {
            return false;
        };
        if self.get(new).is_none() {
            return false;
        }

        fn swap(v: &mut Value, old: NodeId, new: NodeId) -> bool {
            match v {
                Value::Node(c) if *c == old => {
                    *c = new;
                    true
                }
                Value::List(items) => items.iter_mut().any(|i| swap(i, old, new)),
                _ => false,
            }
        }

        let replaced = match self.get_mut(parent) {
            Some(p) => p.children.iter_mut().any(|c| swap(c, old, new)),
            None => false,
        };
        if replaced {
            if let Some(n) = self.get_mut(new) {
                n.parent = Some(parent);
            }
            if let Some(n) = self.get_mut(old) {
                n.parent = None;
            }
        }
        replaced
    }

    /// S-expression rendering, e.g. `(Add "1" (Num "2"))`.
    pub fn to_sexpr(&self, value: &Value) -> String {
        let mut out = String::new();
        self.write_sexpr(value, &mut out);
        out
    }

    fn write_sexpr(&self, value: &Value, out: &mut String) {
        match value {
            Value::Text(s) => {
                let _ = write!(out, "{s:?}");
            }
            Value::Empty => out.push_str("()"),
            Value::List(items) => {
                out.push('[');
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    self.write_sexpr(v, out);
                }
                out.push(']');
            }
            Value::Node(id) => match self.get(*id) {
                Some(n) => {
                    out.push('(');
                    out.push_str(&n.kind);
                    for c in &n.children {
                        out.push(' ');
                        self.write_sexpr(c, out);
                    }
                    out.push(')');
                }
                None => {
                    let _ = write!(out, "#<missing {}>", id.0);
                }
            },
        }
    }
}
