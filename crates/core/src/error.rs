// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for tandem-core operations.

use thiserror::Error;

/// All possible errors that can occur in tandem-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed envelope: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode envelope: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("invalid backoff: {0}")]
    InvalidBackoff(String),
}

/// A specialized Result type for tandem-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
