// src/parser/tables/io.rs
use std::{
    io::{BufWriter, Write},
    path::Path,
    time::Instant,
};

use anyhow::{Context, Result, anyhow, bail};

use super::{DENSE_SENTINEL, ParseTables, Row};

// -------------------- JSON --------------------

pub fn save_tables_json(path: &Path, t: &ParseTables) -> Result<()> {
    let f = std::fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer(&mut w, t)?;
    w.flush()?;
    Ok(())
}

pub fn load_tables_json_bytes(data: &[u8]) -> Result<ParseTables> {
    serde_json::from_slice::<ParseTables>(data).context("failed to parse tables JSON")
}

// -------------------- Compact binary --------------------
//   magic: 8 bytes  = "WKPTBL01"
//   u32:   n_state rows
//   u32:   n_goto rows
//   rows:  u8 kind (0 = run-length, 1 = dense), u32 len, i32[len]
// Dense rows are stored without their sentinel.

const BIN_MAGIC: &[u8; 8] = b"WKPTBL01";
const KIND_SPARSE: u8 = 0;
const KIND_DENSE: u8 = 1;

fn write_row<W: Write>(w: &mut W, row: &Row) -> Result<()> {
    let (kind, entries) = if row.is_dense() {
        (KIND_DENSE, &row.0[1..])
    } else {
        (KIND_SPARSE, &row.0[..])
    };
    w.write_all(&[kind])?;
    w.write_all(&(entries.len() as u32).to_le_bytes())?;
    for &e in entries {
        let v = i32::try_from(e).map_err(|_| anyhow!("table entry {e} does not fit in i32"))?;
        w.write_all(&v.to_le_bytes())?;
    }
    Ok(())
}

pub fn save_tables_bin(path: &Path, t: &ParseTables) -> Result<()> {
    let instant = Instant::now();
    let f = std::fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(f);

    w.write_all(BIN_MAGIC)?;
    w.write_all(&(t.state.len() as u32).to_le_bytes())?;
    w.write_all(&(t.goto.len() as u32).to_le_bytes())?;
    for row in t.state.iter().chain(t.goto.iter()) {
        write_row(&mut w, row)?;
    }
    w.flush()?;

    log::debug!(
        "saved parse tables to {} in {} ms",
        path.display(),
        instant.elapsed().as_millis()
    );
    Ok(())
}

#[inline]
fn take<const N: usize>(buf: &mut &[u8], what: &str) -> Result<[u8; N]> {
    if buf.len() < N {
        bail!("truncated {what}");
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[..N]);
    *buf = &buf[N..];
    Ok(out)
}

fn read_row(buf: &mut &[u8]) -> Result<Row> {
    let [kind] = take::<1>(buf, "row kind")?;
    let len = u32::from_le_bytes(take(buf, "row length")?) as usize;
    // Each entry takes 4 bytes; never reserve more than the input can hold.
    let mut entries = Vec::with_capacity(len.min(buf.len() / 4) + 1);
    match kind {
        KIND_DENSE => entries.push(DENSE_SENTINEL),
        KIND_SPARSE => {}
        other => bail!("unknown row kind {other}"),
    }
    for _ in 0..len {
        entries.push(i32::from_le_bytes(take(buf, "row entry")?) as i64);
    }
    Ok(Row(entries))
}

pub fn load_tables_bin_bytes(mut data: &[u8]) -> Result<ParseTables> {
    let magic: [u8; 8] = take(&mut data, "magic")?;
    if &magic != BIN_MAGIC {
        bail!("bad magic in parse tables .bin");
    }
    let n_state = u32::from_le_bytes(take(&mut data, "state count")?) as usize;
    let n_goto = u32::from_le_bytes(take(&mut data, "goto count")?) as usize;

    // A row is at least 5 bytes (kind + length).
    let mut state = Vec::with_capacity(n_state.min(data.len() / 5));
    for _ in 0..n_state {
        state.push(read_row(&mut data)?);
    }
    let mut goto = Vec::with_capacity(n_goto.min(data.len() / 5));
    for _ in 0..n_goto {
        goto.push(read_row(&mut data)?);
    }
    if !data.is_empty() {
        log::warn!("{} trailing bytes after parse tables", data.len());
    }
    Ok(ParseTables { state, goto })
}
