// src/parser/action.rs
// Action functions dispatched by positive state-table entries (id = index + 1).
// Each one fuses grammar mechanics and semantics: it edits the value stack
// and tells the engine what to do with the state stack.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{ast::Value, env::Environment, lexer::Lexer};

/// Outcome of an action. Packs into the generated-table layout:
/// low 2 bits discriminant, shift target `>> 2`, reduce length in bits 2..9,
/// goto selector `>> 10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionResult {
    Error,
    Accept,
    Shift(u32),
    Reduce { length: u32, goto: u32 },
}

impl ActionResult {
    pub fn to_bits(self) -> u32 {
        match self {
            ActionResult::Error => 0,
            ActionResult::Accept => 1,
            ActionResult::Shift(state) => (state << 2) | 2,
            ActionResult::Reduce { length, goto } => (goto << 10) | ((length & 0xFF) << 2) | 3,
        }
    }

    pub fn from_bits(bits: u32) -> Self {
        match bits & 3 {
            0 => ActionResult::Error,
            1 => ActionResult::Accept,
            2 => ActionResult::Shift(bits >> 2),
            _ => ActionResult::Reduce {
                length: (bits >> 2) & 0xFF,
                goto: bits >> 10,
            },
        }
    }
}

/// Everything an action may look at or change.
pub struct ActionContext<'a> {
    pub terminal: u32,
    pub env: &'a mut Environment,
    pub values: &'a mut Vec<Value>,
    pub lexer: &'a Lexer,
    pub state: u32,
}

impl ActionContext<'_> {
    /// Remove the last `length` values (fewer if the stack is shorter).
    pub fn take(&mut self, length: u32) -> Vec<Value> {
        let at = self.values.len().saturating_sub(length as usize);
        self.values.split_off(at)
    }
}

type ActionFn = dyn Fn(&mut ActionContext<'_>) -> ActionResult + Send + Sync;

#[derive(Clone)]
pub struct Action(Arc<ActionFn>);

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Action(..)")
    }
}

impl Action {
    pub fn new(f: impl Fn(&mut ActionContext<'_>) -> ActionResult + Send + Sync + 'static) -> Self {
        Action(Arc::new(f))
    }

    #[inline]
    pub fn call(&self, ctx: &mut ActionContext<'_>) -> ActionResult {
        (self.0)(ctx)
    }

    pub fn shift(state: u32) -> Self {
        Action::new(move |_| ActionResult::Shift(state))
    }

    pub fn accept() -> Self {
        Action::new(|_| ActionResult::Accept)
    }

    pub fn error() -> Self {
        Action::new(|_| ActionResult::Error)
    }

    /// Raw packed result, as emitted by a table generator.
    pub fn bits(bits: u32) -> Self {
        Action::new(move |_| ActionResult::from_bits(bits))
    }

    /// Reduce without building a node: one value is kept as is, none becomes
    /// `Empty`, several become a `List`.
    pub fn reduce(length: u32, goto: u32) -> Self {
        Action::new(move |ctx| {
            let mut popped = ctx.take(length);
            let v = match popped.len() {
                0 => Value::Empty,
                1 => popped.pop().unwrap_or_default(),
                _ => Value::List(popped),
            };
            ctx.values.push(v);
            ActionResult::Reduce { length, goto }
        })
    }

    /// Reduce into a node of `kind`, via the environment's registered builder
    /// for that name or a plain arena node when none is registered.
    pub fn reduce_node(length: u32, goto: u32, kind: &str) -> Self {
        let kind: Arc<str> = Arc::from(kind);
        Action::new(move |ctx| {
            let popped = ctx.take(length);
            let v = ctx.env.build(&kind, popped, ctx.lexer);
            ctx.values.push(v);
            ActionResult::Reduce { length, goto }
        })
    }

    pub fn reduce_with(
        length: u32,
        goto: u32,
        f: impl Fn(Vec<Value>, &mut Environment, &Lexer) -> Value + Send + Sync + 'static,
    ) -> Self {
        Action::new(move |ctx| {
            let popped = ctx.take(length);
            let v = f(popped, &mut *ctx.env, ctx.lexer);
            ctx.values.push(v);
            ActionResult::Reduce { length, goto }
        })
    }

    /// Run `hook` on the environment, then behave like `then`.
    pub fn instruction(
        hook: impl Fn(&mut Environment) + Send + Sync + 'static,
        then: Action,
    ) -> Self {
        Action::new(move |ctx| {
            hook(&mut *ctx.env);
            then.call(ctx)
        })
    }
}

/// Serializable description of an action, compiled with `ActionSpec::compile`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ActionSpec {
    Shift {
        state: u32,
    },
    Reduce {
        length: u32,
        goto: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        node: Option<String>,
    },
    Accept,
    Error,
    Bits {
        value: u32,
    },
    Instruction {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        asi: Option<bool>,
        then: Box<ActionSpec>,
    },
}

impl ActionSpec {
    pub fn compile(&self) -> Action {
        match self {
            ActionSpec::Shift { state } => Action::shift(*state),
            ActionSpec::Reduce {
                length,
                goto,
                node: Some(kind),
            } => Action::reduce_node(*length, *goto, kind),
            ActionSpec::Reduce {
                length,
                goto,
                node: None,
            } => Action::reduce(*length, *goto),
            ActionSpec::Accept => Action::accept(),
            ActionSpec::Error => Action::error(),
            ActionSpec::Bits { value } => Action::bits(*value),
            ActionSpec::Instruction { asi, then } => {
                let asi = *asi;
                Action::instruction(
                    move |env| {
                        if let Some(on) = asi {
                            env.asi = on;
                        }
                    },
                    then.compile(),
                )
            }
        }
    }
}
