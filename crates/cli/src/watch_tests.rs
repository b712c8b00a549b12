// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

fn parsed(line: &str) -> SessionCommand {
    SessionCommand::parse(line).unwrap().unwrap()
}

#[parameterized(
    leave = { "leave", SessionCommand::Leave },
    logout = { "logout", SessionCommand::Logout },
    start = { "start", SessionCommand::Start },
    stop = { "stop", SessionCommand::Stop },
    status = { "status", SessionCommand::Status },
    quit = { "quit", SessionCommand::Quit },
    exit = { "exit", SessionCommand::Quit },
    padded = { "  status  ", SessionCommand::Status },
)]
fn bare_commands(line: &str, expected: SessionCommand) {
    assert_eq!(parsed(line), expected);
}

#[test]
fn join_takes_workspace_id() {
    assert_eq!(parsed("join ws1"), SessionCommand::Join("ws1".to_string()));
    assert_eq!(parsed("join   ws2 "), SessionCommand::Join("ws2".to_string()));
}

#[test]
fn login_takes_token() {
    assert_eq!(parsed("login abc"), SessionCommand::Login("abc".to_string()));
}

#[test]
fn send_parses_envelope() {
    let command = parsed(r#"send {"type":"typing","payload":{"channelId":"c1"}}"#);
    let SessionCommand::Send(envelope) = command else {
        unreachable!("send should parse to Send");
    };
    assert_eq!(envelope.kind(), "typing");
    assert_eq!(envelope.payload_str("channelId"), Some("c1"));
}

#[test]
fn blank_line_is_ignored() {
    assert_eq!(SessionCommand::parse("   "), Ok(None));
}

#[parameterized(
    join_without_id = { "join" },
    send_without_body = { "send" },
    send_bad_json = { "send {nope" },
    send_without_type = { r#"send {"payload":{}}"# },
    login_without_token = { "login" },
    unknown = { "dance" },
    extra_argument = { "leave now" },
)]
fn rejected_lines(line: &str) {
    assert!(SessionCommand::parse(line).is_err());
}
