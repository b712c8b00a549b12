// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]

use super::*;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("tandem").chain(args.iter().copied())).unwrap()
}

#[test]
fn watch_requires_origin() {
    assert!(Cli::try_parse_from(["tandem", "watch"]).is_err());
}

#[test]
fn watch_with_workspace() {
    let cli = parse(&["watch", "--origin", "http://localhost:3000", "-w", "ws1"]);
    match cli.command {
        Command::Watch(args) => {
            assert_eq!(args.origin, "http://localhost:3000");
            assert_eq!(args.workspace.as_deref(), Some("ws1"));
        }
        other => panic!("expected watch, got {other:?}"),
    }
}

#[test]
fn global_flags_after_subcommand() {
    let cli = parse(&["config", "--config", "/tmp/t.toml", "--verbose"]);
    assert!(matches!(cli.command, Command::Config));
    assert_eq!(cli.config, Some(PathBuf::from("/tmp/t.toml")));
    assert!(cli.verbose);
}

#[test]
fn cli_definition_is_consistent() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
}
