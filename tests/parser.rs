//! Engine behavior on small hand-built grammars.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use wick_parse::{
    ParseError,
    Value,
    parse,
    parse_traced,
    parser::{
        Action,
        ActionResult,
        ActionSpec,
        Grammar,
        GrammarConfig,
        ParseTables,
        Recovery,
        Row,
        SymbolMap,
        TraceStep,
        tables::DENSE_SENTINEL,
    },
};

const EOF: u32 = 0;
const A: u32 = 1;
const B: u32 = 2;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Slot list -> run-length row; `None` marks "no entry".
fn row(slots: &[Option<i64>]) -> Row {
    let plain: Vec<i64> = slots.iter().map(|s| s.unwrap_or(-1)).collect();
    Row::sparse(&plain)
}

fn ab_symbols() -> SymbolMap {
    let mut m = SymbolMap::new();
    m.insert_text("a", A).insert_text("b", B);
    m
}

/// S -> a b
fn ab_grammar() -> Grammar {
    let tables = ParseTables::new(
        vec![
            row(&[None, Some(1)]),
            row(&[None, None, Some(2)]),
            row(&[Some(3)]),
            row(&[Some(4)]),
        ],
        vec![Row::dense(&[3]), Row::default(), Row::default(), Row::default()],
    );
    let actions = vec![
        Action::shift(1),
        Action::shift(2),
        Action::reduce_node(2, 0, "S"),
        Action::accept(),
    ];
    Grammar::new(ab_symbols(), tables, actions, GrammarConfig::default())
}

#[test]
fn shift_shift_reduce_accept() {
    init();
    let g = ab_grammar();
    let parsed = parse_traced("a b", &g).expect("parses");
    assert_eq!(
        parsed.trace,
        [
            TraceStep::Shift {
                state: 1,
                text: "a".into()
            },
            TraceStep::Shift {
                state: 2,
                text: "b".into()
            },
            TraceStep::Reduce {
                length: 2,
                goto: 0,
                state: 3,
                values: 1
            },
            TraceStep::Accept,
        ]
    );
    let root = parsed.root.as_node().expect("node root");
    assert_eq!(parsed.ast.kind(root), Some("S"));
    assert_eq!(parsed.ast.to_sexpr(&parsed.root), r#"(S "a" "b")"#);
}

#[test]
fn trace_is_off_by_default() {
    let parsed = parse("a b", &ab_grammar()).expect("parses");
    assert!(parsed.trace.is_empty());
}

#[test]
fn premature_end_is_a_syntax_error() {
    init();
    let err = parse("a", &ab_grammar()).expect_err("incomplete");
    assert!(!err.is_internal());
    let d = err.diagnostic().expect("positioned");
    assert!(d.message.contains("end of input"), "{}", d.message);
    assert_eq!((d.line, d.column), (1, 2));
}

#[test]
fn unexpected_token_is_reported_with_text() {
    let err = parse("a a", &ab_grammar()).expect_err("bad token");
    match err {
        ParseError::Syntax(d) => {
            assert_eq!(d.message, "Unexpected token [a]");
            assert_eq!(d.column, 3);
            assert!(d.rendered.contains("    1: a a"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

fn one_state(row0: Row, goto0: Row, actions: Vec<Action>) -> Grammar {
    Grammar::new(
        ab_symbols(),
        ParseTables::new(vec![row0], vec![goto0]),
        actions,
        GrammarConfig {
            max_steps: 100,
            ..GrammarConfig::default()
        },
    )
}

#[test]
fn step_limit_is_internal() {
    // Action 0 on end of input ignores the token forever.
    let g = one_state(Row::dense(&[0]), Row::default(), vec![]);
    let err = parse("", &g).expect_err("loops");
    assert!(matches!(err, ParseError::StepLimit { limit: 100 }));
    assert!(err.is_internal());
}

#[test]
fn missing_action_function() {
    let g = one_state(Row::dense(&[5]), Row::default(), vec![Action::accept()]);
    let err = parse("", &g).expect_err("no such action");
    assert!(matches!(
        err,
        ParseError::InvalidAction {
            state: 0,
            action: 5,
            available: 1
        }
    ));
}

#[test]
fn missing_goto() {
    let g = one_state(Row::dense(&[1]), Row::default(), vec![Action::reduce(0, 3)]);
    let err = parse("", &g).expect_err("no goto");
    assert!(matches!(err, ParseError::InvalidGoto { state: 0, selector: 3 }));
}

#[test]
fn reduce_past_stack_bottom() {
    let g = one_state(Row::dense(&[1]), Row::default(), vec![Action::reduce(2, 0)]);
    let err = parse("", &g).expect_err("underflow");
    assert!(matches!(err, ParseError::StackUnderflow { length: 2, depth: 1 }));
}

#[test]
fn accept_needs_exactly_one_value() {
    let g = one_state(Row::dense(&[1]), Row::default(), vec![Action::accept()]);
    let err = parse("", &g).expect_err("empty stack");
    assert!(matches!(err, ParseError::UnbalancedAccept { depth: 0 }));
}

#[test]
fn empty_reduction_pushes_empty_value() {
    // S -> <empty>
    let g = Grammar::new(
        ab_symbols(),
        ParseTables::new(
            vec![Row::dense(&[1]), Row::dense(&[2])],
            vec![Row::dense(&[1]), Row::default()],
        ),
        vec![Action::reduce(0, 0), Action::accept()],
        GrammarConfig::default(),
    );
    let parsed = parse("", &g).expect("parses");
    assert_eq!(parsed.root, Value::Empty);
}

#[test]
fn handler_gets_one_substitution_before_failing() {
    init();
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let g = ab_grammar().with_handler(1, move |cx| {
        seen.fetch_add(1, Ordering::SeqCst);
        assert_eq!(cx.state, 1);
        assert_eq!(cx.prev.text(), "a");
        // Never accepted in state 1.
        Recovery::Substitute(7)
    });
    let err = parse("a c", &g).expect_err("unrecoverable");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(err.diagnostic().map(|d| d.message.as_str()), Some("Unexpected token [c]"));
}

#[test]
fn handler_resume_without_progress_fails() {
    let g = ab_grammar().with_handler(1, |cx| Recovery::Resume(cx.terminal));
    assert!(matches!(parse("a c", &g), Err(ParseError::Syntax(_))));
}

#[test]
fn handler_substitution_can_complete_a_parse() {
    // The handler supplies the missing `b`; the synthesized token is empty text.
    let g = ab_grammar().with_handler(1, |cx| {
        if cx.accepts(B) {
            Recovery::Substitute(B)
        } else {
            Recovery::Fail
        }
    });
    let parsed = parse("a", &g).expect("recovered");
    assert_eq!(parsed.ast.to_sexpr(&parsed.root), r#"(S "a" "")"#);
}

#[test]
fn error_terminal_is_substituted_once() {
    init();
    const C: u32 = 3;
    const ERR: u32 = 9;
    let mut symbols = ab_symbols();
    symbols.insert_text("c", C);
    // S -> a ERR c
    let mut s1 = vec![None; 10];
    s1[ERR as usize] = Some(2);
    let tables = ParseTables::new(
        vec![
            row(&[None, Some(1)]),
            row(&s1),
            row(&[None, None, None, Some(3)]),
            row(&[Some(4)]),
            row(&[Some(5)]),
        ],
        vec![Row::dense(&[4])],
    );
    let actions = vec![
        Action::shift(1),
        Action::shift(2),
        Action::shift(3),
        Action::reduce_node(3, 0, "S"),
        Action::accept(),
    ];
    let config = GrammarConfig {
        error_terminal: Some(ERR),
        ..GrammarConfig::default()
    };
    let g = Grammar::new(symbols, tables, actions, config);
    let parsed = parse_traced("a c", &g).expect("recovers");
    assert_eq!(parsed.ast.to_sexpr(&parsed.root), r#"(S "a" "" "c")"#);
    assert!(parsed.trace.contains(&TraceStep::Recover {
        state: 1,
        from: C,
        to: ERR
    }));
}

#[test]
fn generic_symbol_is_rederived_from_text() {
    init();
    const SYM: u32 = 6;
    const ARROW: u32 = 7;
    let mut symbols = SymbolMap::new();
    symbols.insert_text("=>", ARROW);
    let mut s0 = vec![None; 8];
    s0[ARROW as usize] = Some(1);
    let tables = ParseTables::new(
        vec![row(&s0), row(&[Some(2)])],
        vec![Row::default(), Row::default()],
    );
    let config = GrammarConfig {
        symbol_terminal: Some(SYM),
        ..GrammarConfig::default()
    };
    let g = Grammar::new(symbols, tables, vec![Action::shift(1), Action::accept()], config);
    assert!(g.symbol_trie().is_some());

    let parsed = parse_traced("=>", &g).expect("parses");
    assert_eq!(parsed.root, Value::Text("=>".into()));
    assert_eq!(
        parsed.trace[0],
        TraceStep::Recover {
            state: 0,
            from: SYM,
            to: ARROW
        }
    );
}

#[test]
fn greedy_operator_backs_off_to_one_character() {
    const EQ: u32 = 3;
    const EQEQ: u32 = 4;
    let mut symbols = SymbolMap::new();
    symbols.insert_text("=", EQ).insert_text("==", EQEQ);
    let mut s = vec![None; 5];
    s[EQ as usize] = Some(1);
    let mut s1 = vec![None; 5];
    s1[EQ as usize] = Some(2);
    // S -> = =
    let tables = ParseTables::new(
        vec![row(&s), row(&s1), row(&[Some(3)]), row(&[Some(4)])],
        vec![Row::dense(&[3])],
    );
    let actions = vec![
        Action::shift(1),
        Action::shift(2),
        Action::reduce(2, 0),
        Action::accept(),
    ];
    let g = Grammar::new(symbols, tables, actions, GrammarConfig::default());
    let parsed = parse("==", &g).expect("parses");
    assert_eq!(
        parsed.root,
        Value::List(vec![Value::Text("=".into()), Value::Text("=".into())])
    );
}

#[test]
fn action_results_pack_into_bits() {
    assert_eq!(ActionResult::Error.to_bits(), 0);
    assert_eq!(ActionResult::Accept.to_bits(), 1);
    assert_eq!(ActionResult::Shift(5).to_bits(), (5 << 2) | 2);
    let r = ActionResult::Reduce { length: 3, goto: 7 };
    assert_eq!(r.to_bits(), (7 << 10) | (3 << 2) | 3);
    for v in [
        ActionResult::Error,
        ActionResult::Accept,
        ActionResult::Shift(123),
        ActionResult::Reduce {
            length: 255,
            goto: 4000,
        },
    ] {
        assert_eq!(ActionResult::from_bits(v.to_bits()), v);
    }
}

#[test]
fn json_grammar_with_instruction_and_builder() {
    init();
    let json = format!(
        r#"{{
        "config": {{ "eof_terminal": 0 }},
        "symbols": {{ "a": 1, "b": 2 }},
        "state": [[-1, -1, 1], [-2, -1, 2], [3], [4]],
        "goto": [[{DENSE_SENTINEL}, 3], [], [], []],
        "actions": [
            {{ "op": "instruction", "asi": false, "then": {{ "op": "shift", "state": 1 }} }},
            {{ "op": "bits", "value": {} }},
            {{ "op": "reduce", "length": 2, "goto": 0, "node": "Probe" }},
            {{ "op": "accept" }}
        ]
    }}"#,
        ActionResult::Shift(2).to_bits()
    );
    let g = Grammar::from_json_bytes(json.as_bytes())
        .expect("valid grammar")
        .with_function("Probe", |values, env, _lexer| {
            Value::Text(format!("asi={} n={}", env.asi, values.len()))
        });
    let parsed = parse("a b", &g).expect("parses");
    assert_eq!(parsed.root, Value::Text("asi=false n=2".into()));
}

#[test]
fn json_grammar_rejects_unknown_action_ids() {
    let json = r#"{ "state": [[7]], "actions": [ { "op": "accept" } ] }"#;
    let err = Grammar::from_json_bytes(json.as_bytes()).expect_err("bad id");
    assert!(format!("{err:#}").contains("action 7"));
}

#[test]
fn action_spec_serde_shape() {
    let spec: ActionSpec =
        serde_json::from_str(r#"{"op":"reduce","length":2,"goto":1}"#).expect("spec");
    assert_eq!(
        spec,
        ActionSpec::Reduce {
            length: 2,
            goto: 1,
            node: None
        }
    );
    let text = serde_json::to_string(&ActionSpec::Shift { state: 4 }).expect("json");
    assert_eq!(text, r#"{"op":"shift","state":4}"#);
}

#[test]
fn token_types_map_by_name_or_bits() {
    let json = r#"{
        "types": { "identifier": 1, "4": 2 },
        "state": [[4294967295, -1, 1, -1]],
        "goto": [[]],
        "actions": [ { "op": "shift", "state": 0 } ]
    }"#;
    let g = Grammar::from_json_bytes(json.as_bytes()).expect("valid");
    let lex = g.lexer("x");
    assert_eq!(g.symbols.classify(&lex, &g.config), 1);
    let lex = g.lexer("'s'");
    assert_eq!(g.symbols.classify(&lex, &g.config), 2);
    let lex = g.lexer("");
    assert_eq!(g.symbols.classify(&lex, &g.config), EOF);
}
