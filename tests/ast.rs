//! Arena tree bookkeeping.

use wick_parse::{Ast, NodeId, Span, Value};

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

/// (Add (Num "1") [(Num "2") "+"])
fn sample() -> (Ast, NodeId, NodeId, NodeId) {
    let mut ast = Ast::new();
    let one = ast.push("Num", vec![text("1")], Span::default());
    let two = ast.push("Num", vec![text("2")], Span::default());
    let add = ast.push(
        "Add",
        vec![Value::Node(one), Value::List(vec![Value::Node(two), text("+")])],
        Span { offset: 4, line: 0, column: 4 },
    );
    (ast, one, two, add)
}

#[test]
fn push_links_parents_through_lists() {
    let (ast, one, two, add) = sample();
    assert_eq!(ast.len(), 3);
    assert_eq!(ast.parent(one), Some(add));
    assert_eq!(ast.parent(two), Some(add));
    assert_eq!(ast.parent(add), None);
    assert_eq!(ast.child_nodes(add), [one, two]);
    assert!(ast.child_nodes(one).is_empty());
    assert_eq!(ast.kind(add), Some("Add"));
    assert_eq!(ast.get(add).map(|n| n.span.column), Some(4));
}

#[test]
fn sexpr_rendering() {
    let (ast, _, _, add) = sample();
    assert_eq!(
        ast.to_sexpr(&Value::Node(add)),
        r#"(Add (Num "1") [(Num "2") "+"])"#
    );
    assert_eq!(ast.to_sexpr(&Value::Empty), "()");
    assert_eq!(ast.to_sexpr(&Value::Node(NodeId(99))), "#<missing 99>");
}

#[test]
fn replace_node_moves_the_parent_link() {
    let (mut ast, _, two, add) = sample();
    let three = ast.push("Num", vec![text("3")], Span::default());

    assert!(ast.replace_node(two, three));
    assert_eq!(ast.parent(three), Some(add));
    assert_eq!(ast.parent(two), None);
    assert_eq!(
        ast.to_sexpr(&Value::Node(add)),
        r#"(Add (Num "1") [(Num "3") "+"])"#
    );

    // detached and root nodes have no slot to replace
    assert!(!ast.replace_node(two, three));
    assert!(!ast.replace_node(add, three));
    assert!(!ast.replace_node(three, NodeId(42)));
}
