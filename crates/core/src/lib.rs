// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tandem-core: Shared vocabulary for the tandem sync client
//!
//! This crate holds the pieces of the real-time sync protocol that have no
//! I/O: the wire envelope, the server event taxonomy, the semantic cache keys
//! events invalidate, and the reconnect backoff policy.

pub mod backoff;
pub mod cache;
pub mod error;
pub mod event;
pub mod protocol;

pub use backoff::BackoffPolicy;
pub use cache::CacheKey;
pub use error::{Error, Result};
pub use event::EventKind;
pub use protocol::Envelope;
