//! End-to-end command dispatch

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tempfile::TempDir;

use fstree::cli::args::Cli;
use fstree::cli::commands::execute_command;
use fstree::cli::CliError;
use fstree::exitcode;

fn setup(script: &str) -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("script.fst");
    fs::write(&path, script).unwrap();
    (temp, path)
}

fn run(args: &[&str]) -> Result<(), CliError> {
    let cli = Cli::try_parse_from(args).unwrap();
    execute_command(&cli)
}

#[test]
fn given_clean_script_when_running_then_succeeds() {
    let (_temp, script) = setup("root /\nadd etc /\nadd passwd etc\n");

    let result = run(&["fstree", "run", script.to_str().unwrap(), "--digest"]);

    assert!(result.is_ok(), "{result:?}");
}

#[test]
fn given_rejecting_script_when_running_then_exit_code_is_rejected() {
    let (_temp, script) = setup("root R\nadd A R\nadd B A\nmove A R B\n");

    let err = run(&["fstree", "run", script.to_str().unwrap(), "--no-tree"]).unwrap_err();

    assert!(matches!(err, CliError::Rejected { count: 1 }));
    assert_eq!(err.exit_code(), exitcode::REJECTED);
}

#[test]
fn given_malformed_script_when_running_then_exit_code_is_dataerr() {
    let (_temp, script) = setup("add a\n");

    let err = run(&["fstree", "run", script.to_str().unwrap()]).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::DATAERR);
}

#[test]
fn given_several_scripts_when_checking_then_counts_failures() {
    let (temp, good) = setup("root /\nadd a /\n");
    let bad = temp.path().join("bad.fst");
    fs::write(&bad, "root /\nremove / /\n").unwrap();

    let err = run(&[
        "fstree",
        "check",
        good.to_str().unwrap(),
        bad.to_str().unwrap(),
    ])
    .unwrap_err();

    assert!(matches!(
        err,
        CliError::ScriptsFailed {
            count: 1,
            total: 2,
            cause: None
        }
    ));
    assert_eq!(err.exit_code(), exitcode::REJECTED);
    assert_eq!(err.to_string(), "1 of 2 script(s) failed");
}

#[test]
fn given_unparsable_script_when_checking_then_exit_code_is_dataerr() {
    let (temp, good) = setup("root /\nadd a /\n");
    let broken = temp.path().join("broken.fst");
    fs::write(&broken, "root /\nadd a\n").unwrap();

    let err = run(&[
        "fstree",
        "check",
        good.to_str().unwrap(),
        broken.to_str().unwrap(),
    ])
    .unwrap_err();

    assert!(matches!(err, CliError::ScriptsFailed { count: 1, .. }));
    assert_eq!(err.exit_code(), exitcode::DATAERR);
}

#[test]
fn given_missing_script_when_checking_then_exit_code_is_noinput() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("missing.fst");

    let err = run(&["fstree", "check", missing.to_str().unwrap()]).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::NOINPUT);
}

#[test]
fn given_replayed_tree_when_tracing_path_then_unknown_node_is_invalid() {
    let (_temp, script) = setup("root /\nadd etc /\nadd passwd etc\n");

    assert!(run(&["fstree", "path", script.to_str().unwrap(), "passwd"]).is_ok());
    let err = run(&["fstree", "path", script.to_str().unwrap(), "shadow"]).unwrap_err();
    assert_eq!(err.exit_code(), exitcode::USAGE);
}

#[test]
fn given_config_dir_when_showing_config_then_succeeds() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(".fstree.toml"), "default_root = \"R\"\n").unwrap();

    let result = run(&[
        "fstree",
        "-C",
        temp.path().to_str().unwrap(),
        "config",
        "show",
    ]);

    assert!(result.is_ok(), "{result:?}");
}
