// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end tests against an in-process WebSocket server.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tandem_client::{
    CacheKey, ClientConfig, ConnectionState, CredentialSlot, Envelope, OriginEnvironment,
    SyncClient,
};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

const WAIT: Duration = Duration::from_secs(5);

/// Accepts one client, returning the socket and the request target.
async fn accept(listener: &TcpListener) -> (WebSocketStream<TcpStream>, String) {
    let (stream, _) = timeout(WAIT, listener.accept())
        .await
        .expect("client should connect")
        .unwrap();
    let target = Arc::new(Mutex::new(String::new()));
    let seen = Arc::clone(&target);
    let ws = tokio_tungstenite::accept_hdr_async(stream, move |req: &Request, resp: Response| {
        *seen.lock().unwrap() = req.uri().to_string();
        Ok(resp)
    })
    .await
    .unwrap();
    let target = target.lock().unwrap().clone();
    (ws, target)
}

/// Next text frame from the client.
async fn next_text(ws: &mut WebSocketStream<TcpStream>) -> String {
    loop {
        let message = timeout(WAIT, ws.next())
            .await
            .expect("client should send a frame")
            .expect("stream ended")
            .unwrap();
        match message {
            Message::Text(text) => return text.as_str().to_owned(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

async fn wait_for_state(client: &SyncClient, state: ConnectionState) {
    for _ in 0..250 {
        if client.state() == state {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("client never reached {state}, still {}", client.state());
}

fn config() -> ClientConfig {
    ClientConfig {
        backoff_base_ms: 50,
        backoff_cap_ms: 200,
        heartbeat_interval_ms: 0,
        ..ClientConfig::default()
    }
}

#[tokio::test]
async fn joins_dispatches_and_recovers_from_drop() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let environment = OriginEnvironment::new(
        false,
        "127.0.0.1",
        Some(port),
        CredentialSlot::new(Some("tok".to_string())),
    );
    let (invalidations_tx, mut invalidations) = mpsc::unbounded_channel();
    let client = SyncClient::new(config(), Arc::new(environment), Arc::new(invalidations_tx)).unwrap();

    let (events_tx, mut events) = mpsc::unbounded_channel();
    let _sub = client.on_message(move |envelope| {
        events_tx.send(envelope.clone())?;
        Ok(())
    });

    client.set_active_workspace(Some("ws1"));
    client.start();

    // First connection: join on connect, then an event
    let (mut ws, target) = accept(&listener).await;
    assert_eq!(target, "/ws?token=tok");
    let join = Envelope::from_json(&next_text(&mut ws).await).unwrap();
    assert_eq!(join, Envelope::subscribe("ws1"));
    wait_for_state(&client, ConnectionState::Connected).await;

    ws.send(Message::Text(
        r#"{"type":"task:created","payload":{"id":"t1"}}"#.into(),
    ))
    .await
    .unwrap();
    let event = timeout(WAIT, events.recv()).await.unwrap().unwrap();
    assert_eq!(event.kind(), "task:created");
    assert_eq!(event.payload_str("id"), Some("t1"));
    assert_eq!(
        timeout(WAIT, invalidations.recv()).await.unwrap(),
        Some(CacheKey::WorkspaceTasks {
            workspace_id: "ws1".to_string()
        })
    );

    // Server goes away without a close frame
    drop(ws);

    // Second connection after backoff: join is re-sent
    let (mut ws, _) = accept(&listener).await;
    let rejoin = Envelope::from_json(&next_text(&mut ws).await).unwrap();
    assert_eq!(rejoin, Envelope::subscribe("ws1"));
    wait_for_state(&client, ConnectionState::Connected).await;

    // Clean stop sends a normal close
    client.stop();
    assert!(!client.connected());
    let closing = timeout(WAIT, ws.next()).await.unwrap().unwrap().unwrap();
    match closing {
        Message::Close(Some(frame)) => assert_eq!(u16::from(frame.code), 1000),
        other => panic!("expected close frame, got {other:?}"),
    }

    client.shutdown().await;
}

#[tokio::test]
async fn server_close_with_error_code_reconnects() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let environment = OriginEnvironment::new(
        false,
        "127.0.0.1",
        Some(port),
        CredentialSlot::new(Some("tok".to_string())),
    );
    let client = SyncClient::new(
        config(),
        Arc::new(environment),
        Arc::new(tandem_client::NoopInvalidator),
    )
    .unwrap();
    client.start();

    let (mut ws, _) = accept(&listener).await;
    wait_for_state(&client, ConnectionState::Connected).await;
    ws.close(Some(tokio_tungstenite::tungstenite::protocol::CloseFrame {
        code: 1011.into(),
        reason: "restart".into(),
    }))
    .await
    .unwrap();

    let (_ws, _) = accept(&listener).await;
    wait_for_state(&client, ConnectionState::Connected).await;

    client.shutdown().await;
}

#[tokio::test]
async fn unreachable_server_keeps_retrying() {
    // Bind then drop to get a port nobody is listening on
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let environment = OriginEnvironment::new(
        false,
        "127.0.0.1",
        Some(port),
        CredentialSlot::new(Some("tok".to_string())),
    );
    let client = SyncClient::new(
        config(),
        Arc::new(environment),
        Arc::new(tandem_client::NoopInvalidator),
    )
    .unwrap();
    client.start();

    wait_for_state(&client, ConnectionState::Reconnecting).await;
    client.stop();
    assert_eq!(client.state(), ConnectionState::Disconnected);
    client.shutdown().await;
}
