// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tandem: command-line front end for the tandem sync client.
//!
//! - `tandem watch --origin <url>` connects, joins a workspace and streams
//!   inbound events to stdout as JSON lines
//! - `tandem config` prints the configuration in effect

mod cli;
pub mod config;
pub mod env;
pub mod error;
mod watch;

pub use cli::{Cli, Command, WatchArgs};
pub use error::{Error, Result};
pub use watch::SessionCommand;

use tracing_subscriber::EnvFilter;

/// Installs the stderr log subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `info`, or `debug` when verbose.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(env::vars::RUST_LOG)
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Runs one CLI invocation.
pub async fn run(cli: Cli) -> Result<()> {
    let config_file = cli.config.as_deref();
    match cli.command {
        Command::Watch(args) => watch::run(args, config_file).await,
        Command::Config => {
            let config = config::load(config_file)?;
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}
