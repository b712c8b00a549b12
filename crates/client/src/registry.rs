// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Handler registry: fan-out of inbound envelopes to external consumers.
//!
//! Consumers register a handler and receive an [`Unsubscribe`] capability.
//! Dispatch invokes every handler registered when the dispatch began, one at
//! a time, outside the registry lock. A handler that returns an error or
//! panics is logged and skipped; the remaining handlers still run.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tandem_core::Envelope;

use crate::error::HandlerResult;

/// A consumer of inbound envelopes.
pub trait Handler: Send + Sync {
    fn handle(&self, envelope: &Envelope) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(&Envelope) -> HandlerResult + Send + Sync,
{
    fn handle(&self, envelope: &Envelope) -> HandlerResult {
        self(envelope)
    }
}

type HandlerId = u64;

#[derive(Default)]
struct Handlers {
    next_id: HandlerId,
    entries: BTreeMap<HandlerId, Arc<dyn Handler>>,
}

/// The set of registered handlers.
///
/// Cloning yields another handle to the same set.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    inner: Arc<Mutex<Handlers>>,
}

/// Outcome of one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers that returned `Ok`.
    pub delivered: usize,
    /// Handlers that returned an error or panicked.
    pub failed: usize,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a callback. The returned capability removes exactly this handler.
    pub fn register<F>(&self, handler: F) -> Unsubscribe
    where
        F: Fn(&Envelope) -> HandlerResult + Send + Sync + 'static,
    {
        self.register_handler(handler)
    }

    /// Adds a [`Handler`] implementation.
    pub fn register_handler<H>(&self, handler: H) -> Unsubscribe
    where
        H: Handler + 'static,
    {
        let mut handlers = self.lock();
        let id = handlers.next_id;
        handlers.next_id += 1;
        handlers.entries.insert(id, Arc::new(handler));
        tracing::debug!(handler = id, total = handlers.entries.len(), "handler registered");

        Unsubscribe {
            registry: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Invokes every handler registered at the start of the call.
    ///
    /// Handlers added during dispatch are not invoked for this envelope.
    /// Handlers removed during dispatch are not invoked after removal.
    pub fn dispatch(&self, envelope: &Envelope) -> DispatchReport {
        let ids: Vec<HandlerId> = self.lock().entries.keys().copied().collect();
        let mut report = DispatchReport::default();

        for id in ids {
            let Some(handler) = self.lock().entries.get(&id).cloned() else {
                continue;
            };

            match catch_unwind(AssertUnwindSafe(|| handler.handle(envelope))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    tracing::warn!(event = envelope.kind(), handler = id, error = %e, "handler failed");
                    report.failed += 1;
                }
                Err(_) => {
                    tracing::warn!(event = envelope.kind(), handler = id, "handler panicked");
                    report.failed += 1;
                }
            }
        }

        report
    }

    fn lock(&self) -> MutexGuard<'_, Handlers> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Capability that removes one registered handler.
///
/// Removal is idempotent, and outliving the registry is harmless.
#[derive(Debug, Clone)]
pub struct Unsubscribe {
    registry: Weak<Mutex<Handlers>>,
    id: HandlerId,
}

impl Unsubscribe {
    /// Removes the handler. Returns `true` if this call removed it.
    pub fn unsubscribe(&self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let mut handlers = registry.lock().unwrap_or_else(PoisonError::into_inner);
        let removed = handlers.entries.remove(&self.id).is_some();
        if removed {
            tracing::debug!(handler = self.id, total = handlers.entries.len(), "handler removed");
        }
        removed
    }
}

impl std::fmt::Debug for Handlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handlers")
            .field("next_id", &self.next_id)
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
