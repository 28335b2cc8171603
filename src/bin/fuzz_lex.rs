// src/bin/fuzz_lex.rs
// Generate random sources and check the lexer invariants on each.
//   FUZZ_LEN=<bytes>     size of each generated source (default 100000)
//   FUZZ_ITERS=<n>       number of sources (default 20)
//   FUZZ_SEED=<u64>      RNG seed (default 42)
//   FUZZ_FENCES=<n>      random fence pairs per source (default 32)
//   FUZZ_SAVE=1          keep failing sources under FUZZ_DIR (default "fuzz-cases")
//   FUZZ_INPUT=<path>    replay one saved case instead of generating

use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{Context, Result};
use rand::{SeedableRng, rngs::StdRng};
use wick_parse::dev::{generator::gen_source, invariants::check_source};

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn save_case(dir: &Path, seed: u64, iter: usize, src: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let path = dir.join(format!("case-{seed}-{iter}.txt"));
    fs::write(&path, src).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

fn main() -> Result<()> {
    env_logger::init();

    let fences: usize = env_parse("FUZZ_FENCES", 32);
    let seed: u64 = env_parse("FUZZ_SEED", 42);
    let mut rng = StdRng::seed_from_u64(seed);

    if let Ok(path) = std::env::var("FUZZ_INPUT") {
        eprintln!("[replay] reading {path}");
        let src = fs::read_to_string(&path).with_context(|| format!("read {path}"))?;
        let c = check_source(&mut rng, &src, fences)?;
        eprintln!("[replay] ok: {} tokens, {} lines", c.tokens, c.lines);
        return Ok(());
    }

    let len: usize = env_parse("FUZZ_LEN", 100_000);
    let iters: usize = env_parse("FUZZ_ITERS", 20);
    let save = std::env::var("FUZZ_SAVE").ok().as_deref() == Some("1");
    let dir = PathBuf::from(std::env::var("FUZZ_DIR").unwrap_or_else(|_| "fuzz-cases".into()));

    eprintln!("[fuzz] len={len} iters={iters} seed={seed}");
    for i in 0..iters {
        let src = gen_source(&mut rng, len);
        let t0 = Instant::now();
        match check_source(&mut rng, &src, fences) {
            Ok(c) => eprintln!(
                "[fuzz] iter {i}: {} bytes, {} tokens, {} lines, {} fences in {} ms -> OK",
                src.len(),
                c.tokens,
                c.lines,
                c.fences,
                t0.elapsed().as_millis()
            ),
            Err(e) => {
                eprintln!("[fuzz] iter {i}: FAILED: {e:#}");
                if save {
                    let p = save_case(&dir, seed, i, &src)?;
                    eprintln!("[save] wrote {}", p.display());
                }
                std::process::exit(1);
            }
        }
    }
    eprintln!("[fuzz] all iterations passed");
    Ok(())
}
