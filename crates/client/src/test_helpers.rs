// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers: a scripted connector and transport.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tandem_core::Envelope;
use tokio::sync::mpsc;
use tokio::time::Instant;
use url::Url;

use crate::error::{TransportError, TransportResult};
use crate::transport::{Connector, Inbound, Transport, TransportFuture};

/// What the next connect attempt does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    Open,
    Fail,
    /// Never completes.
    Hang,
}

#[derive(Default)]
struct Script {
    outcomes: VecDeque<ConnectOutcome>,
    connect_urls: Vec<Url>,
    connect_times: Vec<Instant>,
    sent: Vec<String>,
    pings: usize,
    closes: Vec<u16>,
    send_should_fail: bool,
    inbound: Option<mpsc::UnboundedSender<Inbound>>,
}

/// Connector whose transports record traffic and replay scripted frames.
///
/// Clones share the same script, so a test keeps one clone after handing
/// another to the client.
#[derive(Clone, Default)]
pub struct MockConnector {
    script: Arc<Mutex<Script>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue outcomes for upcoming attempts. Unscripted attempts open.
    pub fn push_outcomes(&self, outcomes: &[ConnectOutcome]) {
        self.script.lock().unwrap().outcomes.extend(outcomes);
    }

    pub fn connects(&self) -> usize {
        self.script.lock().unwrap().connect_urls.len()
    }

    pub fn connect_urls(&self) -> Vec<Url> {
        self.script.lock().unwrap().connect_urls.clone()
    }

    pub fn connect_times(&self) -> Vec<Instant> {
        self.script.lock().unwrap().connect_times.clone()
    }

    /// Raw frames sent over every transport so far.
    pub fn sent(&self) -> Vec<String> {
        self.script.lock().unwrap().sent.clone()
    }

    pub fn sent_envelopes(&self) -> Vec<Envelope> {
        self.sent()
            .iter()
            .map(|text| Envelope::from_json(text).unwrap())
            .collect()
    }

    pub fn pings(&self) -> usize {
        self.script.lock().unwrap().pings
    }

    /// Close codes the client sent.
    pub fn closes(&self) -> Vec<u16> {
        self.script.lock().unwrap().closes.clone()
    }

    pub fn set_send_fail(&self, fail: bool) {
        self.script.lock().unwrap().send_should_fail = fail;
    }

    /// Push an item to the most recently opened transport.
    pub fn push_inbound(&self, item: Inbound) {
        let script = self.script.lock().unwrap();
        let tx = script.inbound.as_ref().expect("no transport has opened");
        tx.send(item).expect("transport already dropped");
    }

    /// Deliver a text frame from the server.
    pub fn deliver(&self, text: &str) {
        self.push_inbound(Inbound::Text(text.to_string()));
    }

    /// Close the connection from the server side.
    pub fn drop_connection(&self, code: Option<u16>) {
        self.push_inbound(Inbound::Closed { code });
    }
}

impl Connector for MockConnector {
    fn connect(&self, url: Url) -> TransportFuture<'static, Box<dyn Transport>> {
        let mut script = self.script.lock().unwrap();
        script.connect_urls.push(url);
        script.connect_times.push(Instant::now());

        match script.outcomes.pop_front().unwrap_or(ConnectOutcome::Open) {
            ConnectOutcome::Open => {
                let (tx, rx) = mpsc::unbounded_channel();
                script.inbound = Some(tx);
                let transport = MockTransport {
                    script: Arc::clone(&self.script),
                    inbound: rx,
                };
                let transport: Box<dyn Transport> = Box::new(transport);
                Box::pin(async move { TransportResult::Ok(transport) })
            }
            ConnectOutcome::Fail => Box::pin(async {
                TransportResult::<Box<dyn Transport>>::Err(TransportError::ConnectionFailed(
                    "mock failure".into(),
                ))
            }),
            ConnectOutcome::Hang => {
                Box::pin(std::future::pending::<TransportResult<Box<dyn Transport>>>())
            }
        }
    }
}

/// Transport half of [`MockConnector`].
pub struct MockTransport {
    script: Arc<Mutex<Script>>,
    inbound: mpsc::UnboundedReceiver<Inbound>,
}

impl Transport for MockTransport {
    fn send(&mut self, text: String) -> TransportFuture<'_, ()> {
        let mut script = self.script.lock().unwrap();
        let result: TransportResult<()> = if script.send_should_fail {
            Err(TransportError::SendFailed("mock send failure".into()))
        } else {
            script.sent.push(text);
            Ok(())
        };
        Box::pin(async move { result })
    }

    fn recv(&mut self) -> TransportFuture<'_, Inbound> {
        Box::pin(async move {
            let item = self.inbound.recv().await;
            TransportResult::Ok(item.unwrap_or(Inbound::Closed { code: None }))
        })
    }

    fn ping(&mut self) -> TransportFuture<'_, ()> {
        self.script.lock().unwrap().pings += 1;
        Box::pin(async { TransportResult::Ok(()) })
    }

    fn close(&mut self, code: u16) -> TransportFuture<'_, ()> {
        self.script.lock().unwrap().closes.push(code);
        Box::pin(async { TransportResult::Ok(()) })
    }
}
