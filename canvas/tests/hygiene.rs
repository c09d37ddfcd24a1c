//! Hygiene checks for the interaction core.
//!
//! The core is a pure state machine driven by a host: it must not panic on
//! any input, must not do I/O of its own, and reports failures through a
//! returned error or the `log` facade. These tests scan production sources
//! under `src/` (sibling `*_test.rs` files excluded) and the crate manifest.

use std::fs;
use std::path::{Path, PathBuf};

struct SourceFile {
    name: String,
    lines: Vec<String>,
}

/// Production sources with comment lines dropped, so docs may mention
/// anything they like.
fn sources() -> Vec<SourceFile> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
    let mut paths: Vec<PathBuf> = fs::read_dir(&dir)
        .map(|entries| entries.flatten().map(|e| e.path()).collect())
        .unwrap_or_default();
    paths.sort();

    paths
        .into_iter()
        .filter(|p| p.extension().is_some_and(|e| e == "rs"))
        .filter(|p| !p.to_string_lossy().ends_with("_test.rs"))
        .filter_map(|p| {
            let content = fs::read_to_string(&p).ok()?;
            let name = p.file_name()?.to_string_lossy().into_owned();
            let lines = content
                .lines()
                .filter(|l| !l.trim_start().starts_with("//"))
                .map(ToOwned::to_owned)
                .collect();
            Some(SourceFile { name, lines })
        })
        .collect()
}

/// `file:line: text` for every line containing one of `patterns`.
fn offenders(files: &[SourceFile], patterns: &[&str]) -> Vec<String> {
    files
        .iter()
        .flat_map(|f| {
            f.lines
                .iter()
                .enumerate()
                .filter(|(_, line)| patterns.iter().any(|p| line.contains(p)))
                .map(move |(i, line)| format!("  {}:{}: {}", f.name, i + 1, line.trim()))
        })
        .collect()
}

fn assert_clean(rule: &str, patterns: &[&str]) {
    let files = sources();
    assert!(!files.is_empty(), "no sources found under src/");
    let hits = offenders(&files, patterns);
    assert!(hits.is_empty(), "{rule}: {} offending line(s)\n{}", hits.len(), hits.join("\n"));
}

#[test]
fn no_panicking_calls() {
    assert_clean(
        "input must never crash the core",
        &[".unwrap()", ".expect(", "panic!(", "unreachable!(", "todo!(", "unimplemented!("],
    );
}

#[test]
fn no_direct_io() {
    assert_clean(
        "the host owns I/O, clocks and threads",
        &["std::fs", "std::net", "std::process", "std::thread", "std::time", "println!", "print!(", "dbg!("],
    );
}

#[test]
fn host_stack_stays_out() {
    assert_clean("the core logs through `log` and never awaits", &["tracing::", "tokio::", "reqwest::", "async fn"]);
}

#[test]
fn no_lossy_numeric_casts() {
    assert_clean(
        "geometry uses `f64::from`, not `as`",
        &[" as f32", " as f64", " as i32", " as i64", " as u32", " as u64", " as usize", " as isize"],
    );
}

#[test]
fn no_silently_discarded_results() {
    assert_clean(
        "failures are returned or logged",
        &["let _ =", ".ok()", "allow(dead_code)", "allow(unused"],
    );
}

#[test]
fn color_literals_live_in_consts() {
    let files = sources();
    let hits: Vec<String> = files
        .iter()
        .filter(|f| f.name != "consts.rs")
        .flat_map(|f| {
            f.lines
                .iter()
                .enumerate()
                .filter(|(_, line)| {
                    line.match_indices("\"#")
                        .any(|(i, m)| line[i + m.len()..].starts_with(|c: char| c.is_ascii_hexdigit()))
                })
                .map(move |(i, line)| format!("  {}:{}: {}", f.name, i + 1, line.trim()))
        })
        .collect();
    assert!(hits.is_empty(), "hex color literal outside consts.rs\n{}", hits.join("\n"));
}

#[test]
fn manifest_has_no_browser_bindings() {
    let manifest = fs::read_to_string(Path::new(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml")).unwrap_or_default();
    assert!(manifest.contains("[package]"), "Cargo.toml not readable");
    for needle in ["wasm-bindgen", "web-sys", "js-sys", "\"js\"", "cdylib"] {
        assert!(!manifest.contains(needle), "canvas is a native crate; found `{needle}` in Cargo.toml");
    }
}
