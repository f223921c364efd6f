// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! End-to-end tests against the built binary.
//!
//! Each run is its own process, so the address-space ceiling and the
//! SIGSEGV handler are exercised exactly as in production.

use std::process::{Command, Output};

use sqrt_pager::validate::reference_holds;
use sqrt_pager::vm::{oracle, page_size, ENTRY_SIZE};

const ENTRIES: usize = 1 << 27;

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sqrt-pager"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to spawn sqrt-pager")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Collect `table[i] = v` lines
fn read_values(output: &Output) -> Vec<(usize, f64)> {
    stdout(output)
        .lines()
        .filter_map(|line| {
            let rest = line.strip_prefix("table[")?;
            let (index, value) = rest.split_once("] = ")?;
            Some((index.parse().ok()?, value.parse().ok()?))
        })
        .collect()
}

#[test]
fn test_default_validation_passes() {
    let output = run(&["validate"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("All tests passed!"));
    assert!(stderr(&output).contains("page_size is"));
}

#[test]
fn test_no_subcommand_validates() {
    let output = run(&["-q"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("All tests passed! (500000 reads"));
}

#[test]
fn test_first_pages_and_boundary() {
    let per_page = (page_size() / ENTRY_SIZE).to_string();
    let last = (ENTRIES - 1).to_string();
    let output = run(&["read", "0", &per_page, "1", &last]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let values = read_values(&output);
    assert_eq!(values.len(), 4);
    for (index, value) in values {
        assert_eq!(value, oracle::value(index));
        assert!(reference_holds(index, value));
    }
}

#[test]
fn test_read_past_end_fails() {
    let output = run(&["read", &ENTRIES.to_string()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("outside the table"));
}

#[test]
fn test_single_page_resident() {
    let output = run(&["residency", "--pages", "256"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("resident pages: 1 (256 pages touched"));
}

#[test]
fn test_empty_residency_walk_is_rejected() {
    let output = run(&["residency", "--pages", "0"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("at least one page"));
    assert!(!stdout(&output).contains("resident pages"));
}

#[test]
fn test_ceiling_refuses_eager_mapping() {
    let output = run(&["probe-ceiling"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("ceiling enforced"));
    assert_eq!(read_values(&output), [(ENTRIES - 1, oracle::value(ENTRIES - 1))]);
}

#[test]
fn test_probe_without_ceiling_fails() {
    let output = run(&["--no-ceiling", "--entries-log2", "16", "probe-ceiling"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("despite the address-space ceiling"));
}

#[test]
fn test_hint_placement_walk() {
    let output = run(&["--placement", "hint", "validate", "--iterations", "50000", "--seed", "0x1234"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("All tests passed! (50000 reads"));
}

#[test]
fn test_small_table_with_trace_logging() {
    let output = run(&["-vv", "--entries-log2", "12", "validate", "--iterations", "1000"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("fault at"));
    assert!(stderr(&output).contains("address-space ceiling was"));
}

#[test]
fn test_bad_seed_is_rejected() {
    let output = run(&["validate", "--seed", "0xZZ"]);
    assert!(!output.status.success());
}
