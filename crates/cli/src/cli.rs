// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

const WATCH_HELP: &str = "\
Commands (one per line on stdin):
  join <id>     Make <id> the active workspace
  leave         Clear the active workspace
  send <json>   Send an envelope, e.g. send {\"type\":\"typing\"}
  login <token> Set the credential and connect
  logout        Clear the credential and disconnect
  start         Connect
  stop          Disconnect
  status        Print the connection status
  quit          Exit";

#[derive(Parser, Debug)]
#[command(name = "tandem", version)]
#[command(about = "Real-time sync client")]
pub struct Cli {
    /// Config file (default: $TANDEM_CONFIG, then the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect and print inbound events as JSON lines
    #[command(after_help = WATCH_HELP)]
    Watch(WatchArgs),

    /// Print the resolved configuration as TOML
    Config,
}

#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    /// Application origin, e.g. https://app.example.com
    #[arg(long)]
    pub origin: String,

    /// Workspace to join once connected
    #[arg(short, long)]
    pub workspace: Option<String>,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
