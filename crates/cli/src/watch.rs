// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `tandem watch`: an interactive session on one sync client.
//!
//! Inbound envelopes go to stdout as JSON lines. Logs, invalidations and
//! command feedback go to stderr.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tandem_client::{CacheKey, CredentialSlot, Envelope, OriginEnvironment, SyncClient};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::cli::WatchArgs;
use crate::config;
use crate::env;
use crate::error::Result;

/// A line typed on stdin.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Join(String),
    Leave,
    Send(Envelope),
    Login(String),
    Logout,
    Start,
    Stop,
    Status,
    Quit,
}

impl SessionCommand {
    /// Parses one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> std::result::Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match (word, rest) {
            ("join", "") => return Err("usage: join <workspace-id>".to_string()),
            ("join", id) => SessionCommand::Join(id.to_string()),
            ("send", "") => return Err("usage: send <json>".to_string()),
            ("send", json) => SessionCommand::Send(
                Envelope::from_json(json).map_err(|e| format!("invalid envelope: {e}"))?,
            ),
            ("login", "") => return Err("usage: login <token>".to_string()),
            ("login", token) => SessionCommand::Login(token.to_string()),
            ("leave", "") => SessionCommand::Leave,
            ("logout", "") => SessionCommand::Logout,
            ("start", "") => SessionCommand::Start,
            ("stop", "") => SessionCommand::Stop,
            ("status", "") => SessionCommand::Status,
            ("quit" | "exit", "") => SessionCommand::Quit,
            _ => return Err(format!("unknown command: {line}")),
        };
        Ok(Some(command))
    }
}

/// Runs the watch session until `quit`, end of input, or Ctrl-C.
pub async fn run(args: WatchArgs, config_file: Option<&Path>) -> Result<()> {
    let config = config::load(config_file)?;
    let credential = CredentialSlot::new(env::token());
    let environment = OriginEnvironment::parse(&args.origin, credential.clone())?;

    let (invalidations_tx, mut invalidations) = mpsc::unbounded_channel::<CacheKey>();
    let client = SyncClient::new(config, Arc::new(environment), Arc::new(invalidations_tx))?;

    let _printer = client.on_message(|envelope| {
        let line = envelope.to_json()?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{line}")?;
        stdout.flush()?;
        Ok(())
    });

    if credential.get().is_none() {
        tracing::warn!("{} not set, use `login <token>` to connect", env::vars::TANDEM_TOKEN);
    }
    if let Some(workspace) = args.workspace.as_deref() {
        client.set_active_workspace(Some(workspace));
    }
    client.start();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,

            Some(key) = invalidations.recv() => {
                tracing::info!(cache = %key, "invalidated");
            }

            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match SessionCommand::parse(&line) {
                    Ok(Some(SessionCommand::Quit)) => break,
                    Ok(Some(command)) => apply(&client, &credential, command),
                    Ok(None) => {}
                    Err(message) => eprintln!("{message}"),
                }
            }
        }
    }

    client.shutdown().await;
    Ok(())
}

fn apply(client: &SyncClient, credential: &CredentialSlot, command: SessionCommand) {
    match command {
        SessionCommand::Join(id) => client.set_active_workspace(Some(&id)),
        SessionCommand::Leave => client.set_active_workspace(None),
        SessionCommand::Send(envelope) => {
            if !client.connected() {
                eprintln!("not connected, message dropped");
            }
            client.send(envelope);
        }
        SessionCommand::Login(token) => {
            credential.set(token);
            client.start();
        }
        SessionCommand::Logout => {
            credential.clear();
            client.stop();
        }
        SessionCommand::Start => client.start(),
        SessionCommand::Stop => client.stop(),
        SessionCommand::Status => eprintln!("{}", client.status_string()),
        SessionCommand::Quit => {}
    }
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
