// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The sync client facade and its background driver.
//!
//! [`SyncClient`] is the single entry point the application holds. All
//! connection work happens in one background task, the driver, which owns
//! the connection state machine, the subscription state, the dispatcher and
//! the live transport. The facade talks to it over one ordered command
//! channel, so calls take effect in the order they were made. A run of
//! workspace switches queued back to back collapses to the last one.
//!
//! Connection state is mirrored into [`SharedConnectionState`] so reads from
//! the facade never wait on the driver.

use std::sync::Arc;
use std::time::Duration;

use tandem_core::Envelope;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::{ClientConfig, Heartbeat};
use crate::connection::{
    spawn_attempt, CloseReason, ConnectionEvent, ConnectionManager, ConnectionState,
    SharedConnectionState,
};
use crate::dispatch::{CacheInvalidator, EventDispatcher};
use crate::environment::{connection_url, Environment};
use crate::error::{ConfigError, HandlerResult, TransportResult};
use crate::registry::{HandlerRegistry, Unsubscribe};
use crate::subscription::SubscriptionManager;
use crate::transport::{Connector, Inbound, Transport, WebSocketConnector, NORMAL_CLOSURE};

/// Upper bound on waiting for a close frame to go out.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Requests from the facade to the driver.
#[derive(Debug)]
enum Command {
    Start,
    /// Carries the stop generation already published to the shared state.
    Stop(u64),
    Send(Envelope),
    SetWorkspace(Option<String>),
}

/// Real-time sync client.
///
/// Create one per application session and share it by reference. Must be
/// created inside a Tokio runtime.
pub struct SyncClient {
    commands: mpsc::UnboundedSender<Command>,
    shared: Arc<SharedConnectionState>,
    registry: HandlerRegistry,
    shutdown: CancellationToken,
    driver: Option<JoinHandle<()>>,
}

impl SyncClient {
    /// Creates a client that connects over WebSocket.
    pub fn new(
        config: ClientConfig,
        environment: Arc<dyn Environment>,
        invalidator: Arc<dyn CacheInvalidator>,
    ) -> Result<Self, ConfigError> {
        Self::with_connector(
            config,
            environment,
            Arc::new(WebSocketConnector),
            invalidator,
        )
    }

    /// Creates a client that opens transports with `connector`.
    pub fn with_connector(
        config: ClientConfig,
        environment: Arc<dyn Environment>,
        connector: Arc<dyn Connector>,
        invalidator: Arc<dyn CacheInvalidator>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let backoff = config.backoff()?;

        let shared = Arc::new(SharedConnectionState::new());
        let registry = HandlerRegistry::new();
        let shutdown = CancellationToken::new();
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let driver = Driver {
            heartbeat: config.heartbeat(),
            connection: ConnectionManager::new(backoff, Arc::clone(&shared)),
            subscriptions: SubscriptionManager::new(),
            dispatcher: EventDispatcher::new(invalidator, registry.clone()),
            config,
            environment,
            connector,
            transport: None,
            attempt_cancel: shutdown.child_token(),
            shutdown: shutdown.clone(),
            events_tx,
            reconnect_at: None,
            last_inbound: Instant::now(),
            ping_sent_at: None,
        };
        let handle = tokio::spawn(driver.run(commands_rx, events_rx));

        Ok(SyncClient {
            commands,
            shared,
            registry,
            shutdown,
            driver: Some(handle),
        })
    }

    /// Begins connecting if a credential is available.
    ///
    /// Does nothing when no credential exists or a connection is already
    /// active.
    pub fn start(&self) {
        self.command(Command::Start);
    }

    /// Disconnects and cancels any pending reconnect.
    ///
    /// The state reads as disconnected as soon as this returns.
    pub fn stop(&self) {
        let generation = self.shared.stop();
        self.command(Command::Stop(generation));
    }

    /// True only while the transport is open.
    pub fn connected(&self) -> bool {
        self.shared.is_connected()
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.get()
    }

    /// Human-readable connection status, e.g. `reconnecting (attempt 3)`.
    pub fn status_string(&self) -> String {
        self.shared.status_string()
    }

    /// Sends an envelope if connected. Otherwise it is dropped, not queued.
    pub fn send(&self, envelope: Envelope) {
        if !self.connected() {
            tracing::debug!(event = envelope.kind(), "not connected, dropping outbound message");
            return;
        }
        self.command(Command::Send(envelope));
    }

    /// Registers a handler for every inbound envelope.
    ///
    /// Handlers run on the driver task and must not block. The returned
    /// capability removes exactly this handler.
    pub fn on_message<F>(&self, handler: F) -> Unsubscribe
    where
        F: Fn(&Envelope) -> HandlerResult + Send + Sync + 'static,
    {
        self.registry.register(handler)
    }

    /// Sets the workspace whose channel should be joined. `None` leaves it.
    pub fn set_active_workspace(&self, workspace_id: Option<&str>) {
        self.command(Command::SetWorkspace(workspace_id.map(str::to_owned)));
    }

    /// Stops the client and waits for the driver to finish.
    pub async fn shutdown(mut self) {
        self.shared.stop();
        self.shutdown.cancel();
        if let Some(driver) = self.driver.take() {
            if let Err(e) = driver.await {
                tracing::warn!(error = %e, "sync driver ended abnormally");
            }
        }
    }

    fn command(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::debug!("sync driver has exited");
        }
    }
}

impl std::fmt::Debug for SyncClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncClient")
            .field("state", &self.shared.get())
            .field("handlers", &self.registry.len())
            .finish()
    }
}

/// Owns all connection state. Runs until shutdown or until the facade is
/// dropped.
struct Driver {
    config: ClientConfig,
    environment: Arc<dyn Environment>,
    connector: Arc<dyn Connector>,
    connection: ConnectionManager,
    subscriptions: SubscriptionManager,
    dispatcher: EventDispatcher,
    transport: Option<Box<dyn Transport>>,
    heartbeat: Option<Heartbeat>,
    shutdown: CancellationToken,
    /// Cancels the in-flight connection attempt.
    attempt_cancel: CancellationToken,
    events_tx: mpsc::UnboundedSender<ConnectionEvent>,
    reconnect_at: Option<Instant>,
    last_inbound: Instant,
    ping_sent_at: Option<Instant>,
}

impl Driver {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut events: mpsc::UnboundedReceiver<ConnectionEvent>,
    ) {
        let shutdown = self.shutdown.clone();
        loop {
            let connected = self.transport.is_some();
            let reconnect_at = self.reconnect_at;
            let heartbeat_at = self.heartbeat_deadline();

            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command, &mut commands).await,
                    None => break,
                },

                // Results of background connection attempts
                Some(event) = events.recv() => self.handle_connection_event(event).await,

                inbound = recv(&mut self.transport), if connected => {
                    self.handle_inbound(inbound).await;
                }

                _ = sleep_until(reconnect_at), if reconnect_at.is_some() => self.retry(),

                _ = sleep_until(heartbeat_at), if heartbeat_at.is_some() => {
                    self.heartbeat().await;
                }
            }
        }

        self.stop().await;
        tracing::debug!("sync driver stopped");
    }

    async fn handle_command(
        &mut self,
        command: Command,
        commands: &mut mpsc::UnboundedReceiver<Command>,
    ) {
        let mut pending = Some(command);
        while let Some(command) = pending.take() {
            match command {
                Command::Start => self.start(),
                Command::Stop(generation) => {
                    self.connection.acknowledge_stop(generation);
                    self.stop().await;
                }
                Command::Send(envelope) => self.send(envelope).await,
                Command::SetWorkspace(target) => {
                    // Only the last of consecutive switches matters
                    let (target, next) = coalesce_workspace(target, commands);
                    self.set_active_workspace(target).await;
                    pending = next;
                }
            }
        }
    }

    fn start(&mut self) {
        let credential = self.environment.credential();
        let epoch = self.connection.start(credential.is_some());
        self.connect(epoch, credential);
    }

    /// Backoff timer fired.
    fn retry(&mut self) {
        self.reconnect_at = None;
        let credential = self.environment.credential();
        let epoch = self.connection.retry(credential.is_some());
        self.connect(epoch, credential);
    }

    fn connect(&mut self, epoch: Option<u64>, credential: Option<String>) {
        let (Some(epoch), Some(credential)) = (epoch, credential) else {
            return;
        };

        match connection_url(self.environment.as_ref(), &self.config, &credential) {
            Ok(url) => {
                tracing::info!(
                    epoch,
                    host = url.host_str().unwrap_or_default(),
                    attempt = self.connection.attempt(),
                    "connecting"
                );
                self.attempt_cancel = self.shutdown.child_token();
                // Detached; reports back on the events channel
                let _ = spawn_attempt(
                    Arc::clone(&self.connector),
                    url,
                    epoch,
                    self.config.connect_timeout(),
                    self.attempt_cancel.clone(),
                    self.events_tx.clone(),
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot build sync url");
                let delay = self.connection.failed(epoch);
                self.schedule_retry(delay);
            }
        }
    }

    async fn handle_connection_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Opened { epoch, mut transport } => {
                if !self.connection.opened(epoch) {
                    tracing::debug!(epoch, "discarding superseded connection");
                    close_quietly(transport.as_mut()).await;
                    return;
                }
                tracing::info!("sync connected");
                self.transport = Some(transport);
                self.mark_alive();
                if let Some(join) = self.subscriptions.on_connection_established() {
                    self.send(join).await;
                }
            }
            ConnectionEvent::Failed { epoch, error } => {
                if let Some(delay) = self.connection.failed(epoch) {
                    tracing::warn!(error = %error, "connection attempt failed");
                    self.schedule_retry(Some(delay));
                }
            }
        }
    }

    async fn handle_inbound(&mut self, inbound: TransportResult<Inbound>) {
        match inbound {
            Ok(Inbound::Text(text)) => {
                self.mark_alive();
                match Envelope::from_json(&text) {
                    Ok(envelope) => {
                        self.dispatcher
                            .dispatch(&envelope, self.subscriptions.target());
                    }
                    Err(e) => tracing::warn!(error = %e, "dropping malformed frame"),
                }
            }
            Ok(Inbound::Pong) => self.mark_alive(),
            Ok(Inbound::Closed { code }) => {
                let reason = CloseReason::from_code(code);
                match reason {
                    CloseReason::Clean => tracing::info!("server closed connection"),
                    CloseReason::Abnormal => tracing::warn!(code = ?code, "connection lost"),
                }
                self.connection_lost(reason);
            }
            Err(e) => {
                tracing::warn!(error = %e, "receive failed");
                self.connection_lost(CloseReason::Abnormal);
            }
        }
    }

    async fn set_active_workspace(&mut self, target: Option<String>) {
        let connected = self.connection.is_connected();
        for message in self.subscriptions.set_active_workspace(target, connected) {
            self.send(message).await;
        }
    }

    async fn send(&mut self, envelope: Envelope) {
        if !self.connection.is_connected() {
            tracing::debug!(event = envelope.kind(), "not connected, dropping outbound message");
            return;
        }
        let Some(transport) = self.transport.as_mut() else {
            return;
        };
        let text = match envelope.to_json() {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(event = envelope.kind(), error = %e, "cannot encode message");
                return;
            }
        };
        tracing::trace!(event = envelope.kind(), "sending");
        if let Err(e) = transport.send(text).await {
            tracing::warn!(error = %e, "send failed");
            self.connection_lost(CloseReason::Abnormal);
        }
    }

    async fn heartbeat(&mut self) {
        if self.ping_sent_at.is_some() {
            tracing::warn!("heartbeat timed out");
            self.connection_lost(CloseReason::Abnormal);
            return;
        }
        let Some(transport) = self.transport.as_mut() else {
            return;
        };
        tracing::trace!("sending heartbeat ping");
        match transport.ping().await {
            Ok(()) => self.ping_sent_at = Some(Instant::now()),
            Err(e) => {
                tracing::warn!(error = %e, "heartbeat ping failed");
                self.connection_lost(CloseReason::Abnormal);
            }
        }
    }

    /// When the heartbeat branch should next fire.
    fn heartbeat_deadline(&self) -> Option<Instant> {
        let heartbeat = self.heartbeat?;
        if self.transport.is_none() {
            return None;
        }
        Some(match self.ping_sent_at {
            Some(sent) => sent + heartbeat.timeout,
            None => self.last_inbound + heartbeat.interval,
        })
    }

    fn mark_alive(&mut self) {
        self.last_inbound = Instant::now();
        self.ping_sent_at = None;
    }

    fn connection_lost(&mut self, reason: CloseReason) {
        self.transport = None;
        self.ping_sent_at = None;
        self.subscriptions.on_connection_lost();
        let delay = self.connection.closed(reason);
        self.schedule_retry(delay);
    }

    fn schedule_retry(&mut self, delay: Option<Duration>) {
        if let Some(delay) = delay {
            tracing::warn!(
                delay_ms = delay.as_millis() as u64,
                attempt = self.connection.attempt(),
                "reconnecting"
            );
            self.reconnect_at = Some(Instant::now() + delay);
        }
    }

    async fn stop(&mut self) {
        self.reconnect_at = None;
        self.attempt_cancel.cancel();
        let was_active = self.connection.stop();
        self.subscriptions.on_connection_lost();
        self.ping_sent_at = None;
        if let Some(mut transport) = self.transport.take() {
            close_quietly(transport.as_mut()).await;
        }
        if was_active {
            tracing::info!("sync stopped");
        }
    }
}

/// Folds queued `SetWorkspace` commands into `target`.
///
/// Stops at the first other command and hands it back so it runs next.
fn coalesce_workspace(
    mut target: Option<String>,
    commands: &mut mpsc::UnboundedReceiver<Command>,
) -> (Option<String>, Option<Command>) {
    while let Ok(command) = commands.try_recv() {
        match command {
            Command::SetWorkspace(next) => target = next,
            other => return (target, Some(other)),
        }
    }
    (target, None)
}

async fn recv(transport: &mut Option<Box<dyn Transport>>) -> TransportResult<Inbound> {
    match transport {
        Some(transport) => transport.recv().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn close_quietly(transport: &mut dyn Transport) {
    match tokio::time::timeout(CLOSE_TIMEOUT, transport.close(NORMAL_CLOSURE)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::debug!(error = %e, "close failed"),
        Err(_) => tracing::debug!("close timed out"),
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
