use clap::error::ErrorKind;
use clap::Parser;
use provision::cli::{exit_code, Args, Command, ListKind, MISSING_ARGUMENT_EXIT_CODE};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command as Process;
use tempfile::TempDir;

fn make_args(args: &[&str]) -> Vec<OsString> {
    let mut res = vec![OsString::from("provision")];
    res.extend(args.iter().map(OsString::from));
    res
}

#[test]
fn test_no_subcommand() {
    let parsed = Args::try_parse_from(make_args(&[])).unwrap();
    assert!(parsed.command.is_none());
    assert_eq!(parsed.root, PathBuf::from("."));
    assert!(parsed.manifest.is_none());
    assert!(!parsed.verbose);
}

#[test]
fn test_list_types() {
    let parsed = Args::try_parse_from(make_args(&["list"])).unwrap();
    match parsed.command {
        Some(Command::List { kind }) => assert_eq!(kind, ListKind::All),
        other => panic!("Expected list command, got {other:?}"),
    }

    let parsed = Args::try_parse_from(make_args(&["list", "--type", "ai-tools"])).unwrap();
    match parsed.command {
        Some(Command::List { kind }) => {
            assert!(kind.includes_ai_tools());
            assert!(!kind.includes_projects());
        }
        other => panic!("Expected list command, got {other:?}"),
    }

    assert!(Args::try_parse_from(make_args(&["list", "--type", "plugins"])).is_err());
}

#[test]
fn test_provision_metadata() {
    let args = make_args(&[
        "provision",
        "-t",
        "claude-code",
        "-p",
        "mkdocs",
        "--project-name",
        "docs-site",
        "--project-email",
        "team@example.com",
    ]);
    let parsed = Args::try_parse_from(args).unwrap();

    let Some(Command::Provision(provision)) = parsed.command else {
        panic!("Expected provision command");
    };
    assert_eq!(provision.ai_tool.as_deref(), Some("claude-code"));
    assert_eq!(provision.project_type.as_deref(), Some("mkdocs"));

    let metadata = provision.metadata();
    assert_eq!(metadata.name.as_deref(), Some("docs-site"));
    assert_eq!(metadata.email.as_deref(), Some("team@example.com"));
    assert!(metadata.description.is_none());
}

#[test]
fn test_global_flags_after_subcommand() {
    let args = make_args(&["clean", "--ai-tool", "copilot", "--root", "/repo", "-v"]);
    let parsed = Args::try_parse_from(args).unwrap();

    assert_eq!(parsed.root, PathBuf::from("/repo"));
    assert!(parsed.verbose);
    match parsed.command {
        Some(Command::Clean { ai_tool }) => assert_eq!(ai_tool, "copilot"),
        other => panic!("Expected clean command, got {other:?}"),
    }
}

#[test]
fn test_pull_repo_args() {
    let args = make_args(&["pull-repo", "--repo", "awesome", "--target-dir", "vendor"]);
    let parsed = Args::try_parse_from(args).unwrap();

    match parsed.command {
        Some(Command::PullRepo { repo, target_dir }) => {
            assert_eq!(repo, "awesome");
            assert_eq!(target_dir, PathBuf::from("vendor"));
        }
        other => panic!("Expected pull-repo command, got {other:?}"),
    }
}

#[test]
fn test_publish_targets() {
    let parsed = Args::try_parse_from(make_args(&["publish"])).unwrap();
    match parsed.command {
        Some(Command::Publish { targets }) => assert!(targets.is_empty()),
        other => panic!("Expected publish command, got {other:?}"),
    }

    let parsed = Args::try_parse_from(make_args(&["publish", "a", "b"])).unwrap();
    match parsed.command {
        Some(Command::Publish { targets }) => assert_eq!(targets, vec!["a", "b"]),
        other => panic!("Expected publish command, got {other:?}"),
    }
}

#[test]
fn test_missing_required_args() {
    let err = Args::try_parse_from(make_args(&["clean"])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

    let err = Args::try_parse_from(make_args(&["pull-repo", "--repo", "x"])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
}

#[test]
fn test_exit_code_mapping() {
    let err = Args::try_parse_from(make_args(&["clean"])).unwrap_err();
    assert_eq!(exit_code(&err), MISSING_ARGUMENT_EXIT_CODE);

    let err = Args::try_parse_from(make_args(&["--help"])).unwrap_err();
    assert_eq!(exit_code(&err), 0);
}

fn run_binary(args: &[&str]) -> i32 {
    let output = Process::new(env!("CARGO_BIN_EXE_provision")).args(args).output().unwrap();
    output.status.code().unwrap()
}

#[test]
fn test_binary_exit_codes() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().to_str().unwrap();
    std::fs::write(
        temp_dir.path().join("map.yaml"),
        "targets:\n  t:\n    copies: [{from: a, to: b}]\n",
    )
    .unwrap();

    assert_eq!(run_binary(&["--root", root, "clean"]), 2);
    assert_eq!(run_binary(&["--root", root, "pull-repo", "--repo", "x"]), 2);
    assert_eq!(run_binary(&["--root", root]), 1);
    assert_eq!(run_binary(&["--root", root, "clean", "-t", "unknown"]), 1);
    assert_eq!(run_binary(&["--root", root, "list"]), 0);
}
