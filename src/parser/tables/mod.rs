// src/parser/tables/mod.rs
// State/goto tables of the shift-reduce automaton.
//
// A row is either dense (first entry is DENSE_SENTINEL, slot i lives at i + 1)
// or run-length encoded ("lsm"):
//   v >= 0        one slot holding v
//   -n, v         n consecutive slots holding v (v taken verbatim, may be -1)
// Slots past the encoded range hold NO_ENTRY.

pub mod io;

use serde::{Deserialize, Serialize};

pub use io::{load_tables_bin_bytes, load_tables_json_bytes, save_tables_bin, save_tables_json};

pub const DENSE_SENTINEL: i64 = 0xFFFF_FFFF;
pub const NO_ENTRY: i64 = -1;

/// Decode slot `index` of a dense or run-length encoded row.
pub fn lsm(index: u32, row: &[i64]) -> i64 {
    if row.first() == Some(&DENSE_SENTINEL) {
        return row
            .get((index as usize).saturating_add(1))
            .copied()
            .unwrap_or(NO_ENTRY);
    }

    let index = index as u64;
    let mut slot = 0u64;
    let mut i = 0;
    while i < row.len() {
        let e = row[i];
        if e < 0 {
            let run = e.unsigned_abs();
            let value = row.get(i + 1).copied().unwrap_or(NO_ENTRY);
            if index < slot + run {
                return value;
            }
            slot += run;
            i += 2;
        } else {
            if slot == index {
                return e;
            }
            slot += 1;
            i += 1;
        }
    }
    NO_ENTRY
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(pub Vec<i64>);

impl Row {
    #[inline]
    pub fn get(&self, index: u32) -> i64 {
        lsm(index, &self.0)
    }

    pub fn is_dense(&self) -> bool {
        self.0.first() == Some(&DENSE_SENTINEL)
    }

    /// Dense row: slot i holds `values[i]`.
    pub fn dense(values: &[i64]) -> Row {
        let mut v = Vec::with_capacity(values.len() + 1);
        v.push(DENSE_SENTINEL);
        v.extend_from_slice(values);
        Row(v)
    }

    /// Run-length encode `values`; trailing NO_ENTRY slots are dropped.
    pub fn sparse(values: &[i64]) -> Row {
        let used = values
            .iter()
            .rposition(|&v| v != NO_ENTRY)
            .map_or(0, |i| i + 1);
        let values = &values[..used];

        let mut out = Vec::new();
        let mut i = 0;
        while i < values.len() {
            let v = values[i];
            let run = values[i..].iter().take_while(|&&x| x == v).count();
            if run == 1 && v >= 0 {
                out.push(v);
            } else {
                out.push(-(run as i64));
                out.push(v);
            }
            i += run;
        }
        Row(out)
    }

    /// Expand into `n` plain slots.
    pub fn expand(&self, n: u32) -> Vec<i64> {
        (0..n).map(|i| self.get(i)).collect()
    }
}

/// Action rows (indexed by terminal) and goto rows (indexed by goto selector),
/// one of each per automaton state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParseTables {
    pub state: Vec<Row>,
    pub goto: Vec<Row>,
}

impl ParseTables {
    pub fn new(state: Vec<Row>, goto: Vec<Row>) -> Self {
        Self { state, goto }
    }

    pub fn n_states(&self) -> usize {
        self.state.len()
    }

    /// Action id for (`state`, `terminal`); NO_ENTRY when the state is unknown.
    #[inline]
    pub fn action(&self, state: u32, terminal: u32) -> i64 {
        self.state
            .get(state as usize)
            .map_or(NO_ENTRY, |row| row.get(terminal))
    }

    #[inline]
    pub fn goto(&self, state: u32, selector: u32) -> i64 {
        self.goto
            .get(state as usize)
            .map_or(NO_ENTRY, |row| row.get(selector))
    }

    /// True when `state` dispatches an action function for `terminal`.
    pub fn accepts(&self, state: u32, terminal: u32) -> bool {
        self.action(state, terminal) > 0
    }
}
