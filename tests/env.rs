//! Child parses requested from node builders, presets, and batch parsing.

use std::{path::Path, sync::Arc};

use serde_json::json;
use wick_parse::{
    Environment,
    ParseError,
    Span,
    Value,
    parse,
    parse_batch,
    parse_with_env,
    parser::Grammar,
};

fn plain_grammar() -> Grammar {
    let _ = env_logger::builder().is_test(true).try_init();
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("grammars/statements.json");
    Grammar::load(&path).expect("bundled grammar loads")
}

async fn load(name: String) -> anyhow::Result<String> {
    tokio::task::yield_now().await;
    let text = match name.as_str() {
        "childa" => "let leafa = 1",
        "childb" => "let childc = 2",
        "childc" => "let leafc = 3",
        "childbroken" => "let = 1",
        "childown" => "let childa = 4",
        _ => anyhow::bail!("no such document `{name}`"),
    };
    Ok(text.to_string())
}

/// `let child* = n` statements pull in the document of that name. The
/// innermost preset's `mode`, if any, is appended to every `Let` node.
fn grammar() -> Grammar {
    let own = Arc::new(plain_grammar());
    plain_grammar().with_function("Let", move |mut values, env, _lex| {
        let name = values
            .get(1)
            .and_then(Value::as_text)
            .unwrap_or_default()
            .to_string();
        if name == "childown" {
            env.spawn_child_with(name.clone(), Arc::clone(&own), Box::pin(load(name)));
        } else if name.starts_with("child") {
            env.spawn_child(name.clone(), Box::pin(load(name)));
        }
        let mode = env
            .preset()
            .and_then(|p| p["mode"].as_str())
            .map(str::to_owned);
        if let Some(mode) = mode {
            values.push(Value::Text(mode));
        }
        Value::Node(env.ast.push("Let", values, Span::default()))
    })
}

#[tokio::test]
async fn children_resolve_in_request_order() {
    let g = Arc::new(grammar());
    let parsed = parse("let childb = 1\nlet childa = 2", &g).expect("parses");
    assert_eq!(parsed.pending(), 2);

    let resolved = parsed.resolve(Arc::clone(&g)).await.expect("resolves");
    assert_eq!(resolved.name, None);
    let names: Vec<_> = resolved
        .children
        .iter()
        .map(|c| c.name.as_deref().unwrap_or_default())
        .collect();
    assert_eq!(names, ["childb", "childa"]);
    // childb pulls in childc in turn
    assert_eq!(resolved.documents(), 4);

    let leaf = resolved.find("childc").expect("nested child");
    assert_eq!(
        leaf.ast.to_sexpr(&leaf.root),
        r#"(Program (Let "let" "leafc" "=" "3" ""))"#
    );
    assert!(resolved.find("missing").is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn presets_reach_children() {
    let g = Arc::new(grammar());
    let mut env = Environment::for_grammar(&g);
    env.push_preset(json!({ "mode": "loose" }));
    env.push_preset(json!({ "mode": "strict" }));
    let parsed = parse_with_env("let childa = 1", &g, env).expect("parses");
    assert_eq!(parsed.presets.len(), 2);

    let resolved = parsed.resolve(Arc::clone(&g)).await.expect("resolves");
    assert!(resolved.ast.to_sexpr(&resolved.root).contains(r#""strict""#));
    let child = resolved.find("childa").expect("child");
    assert_eq!(
        child.ast.to_sexpr(&child.root),
        r#"(Program (Let "let" "leafa" "=" "1" "" "strict"))"#
    );
}

#[tokio::test]
async fn child_with_its_own_grammar() {
    let g = Arc::new(grammar());
    let parsed = parse("let childown = 1", &g).expect("parses");
    let resolved = parsed.resolve(g).await.expect("resolves");
    // the plain grammar has no builder, so `childa` inside is not followed
    assert_eq!(resolved.documents(), 2);
    assert!(resolved.find("childa").is_none());
}

#[tokio::test]
async fn failed_load_names_the_child() {
    let g = Arc::new(grammar());
    let parsed = parse("let childmissing = 1", &g).expect("parses");
    match parsed.resolve(g).await {
        Err(ParseError::Load { name, message }) => {
            assert_eq!(name, "childmissing");
            assert!(message.contains("no such document"), "{message}");
        }
        other => panic!("expected a load error, got {other:?}"),
    }
}

#[tokio::test]
async fn child_syntax_error_fails_the_tree() {
    let g = Arc::new(grammar());
    let parsed = parse("let childa = 1\nlet childbroken = 2", &g).expect("parses");
    let err = parsed.resolve(g).await.expect_err("broken child");
    assert!(matches!(err, ParseError::Syntax(_)), "{err:?}");
}

#[tokio::test]
async fn no_children_resolves_immediately() {
    let g = Arc::new(grammar());
    let parsed = parse("let x = 1", &g).expect("parses");
    assert_eq!(parsed.pending(), 0);
    let resolved = parsed.resolve(g).await.expect("resolves");
    assert_eq!(resolved.documents(), 1);
}

#[test]
fn batch_keeps_input_order() {
    let g = plain_grammar();
    let sources = ["let a = 1", "let = 2", "let b = 3;", "let c = 4\nlet d = 5"];
    let results = parse_batch(&sources, &g);
    assert_eq!(results.len(), sources.len());
    assert!(results[1].is_err());

    let rendered: Vec<String> = results
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .map(|p| p.ast.to_sexpr(&p.root))
        .collect();
    assert_eq!(rendered.len(), 3);
    assert!(rendered[0].contains(r#""a""#));
    assert!(rendered[1].contains(r#""b" "=" "3" ";""#));
    assert_eq!(results[3].as_ref().map(|p| p.ast.len()).ok(), Some(4));
}
