// CLI behaviour: exit status, progress lines, report format and miette errors.
// Requires: assert_cmd, predicates crates in [dev-dependencies]

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn sx_doctest() -> Command {
    let mut cmd = Command::cargo_bin("sx-doctest").unwrap();
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd
}

#[test]
fn failing_doctests_exit_non_zero_with_report() {
    sx_doctest()
        .arg("tests/fixtures/math.sx")
        .assert()
        .failure()
        .stdout(contains("retrieving tests/fixtures/math.sx..."))
        .stdout(contains("running doctests in math.sx..."))
        .stdout(contains(".x.x.\n"))
        .stdout(contains("FAIL: expected 5 on line 6 (got 4)"));
}

#[test]
fn passing_doctests_exit_zero() {
    sx_doctest()
        .arg("tests/fixtures/state.sx")
        .assert()
        .success()
        .stdout(contains("..\n"));
}

#[test]
fn silent_prints_nothing() {
    sx_doctest()
        .args(["--silent", "tests/fixtures/state.sx"])
        .assert()
        .success()
        .stdout(predicates::str::is_empty());
}

#[test]
fn print_shows_rewritten_program() {
    sx_doctest()
        .args(["--print", "tests/fixtures/state.sx"])
        .assert()
        .success()
        .stdout(contains("(enqueue! __doctest {"))
        .stdout(contains("retrieving").not());
}

#[test]
fn invalid_option_is_reported_through_miette() {
    sx_doctest()
        .args(["--module", "umd", "tests/fixtures/state.sx"])
        .assert()
        .failure()
        .stderr(contains("Invalid module `umd'"))
        .stderr(contains("doctest::config::invalid_option"));
}

#[test]
fn unknown_extension_is_a_config_error() {
    sx_doctest()
        .arg("notes.txt")
        .assert()
        .failure()
        .stderr(contains("Cannot infer type from extension"));
}

#[test]
fn json_report() {
    let output = sx_doctest()
        .args(["--json", "tests/fixtures/literate.sxl"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json[0]["mode"], "results");
    assert_eq!(json[0]["output"][1]["line"], 9);
    assert_eq!(json[0]["output"][1]["actual"], "4");
}

#[test]
fn type_flag_overrides_extension() {
    sx_doctest()
        .args(["--type", "sx", "--silent", "tests/fixtures/state.sx"])
        .assert()
        .success();
    sx_doctest()
        .args(["--type", "coffee", "tests/fixtures/state.sx"])
        .assert()
        .failure()
        .stderr(contains("Invalid type `coffee'"));
}

#[test]
fn directories_are_searched() {
    sx_doctest()
        .args(["--module", "amd", "tests/fixtures"])
        .assert()
        .failure()
        .stdout(contains("running doctests in amd.sx..."))
        .stdout(contains("running doctests in state.sx..."));
}
