// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use tandem_client::ConfigError;
use thiserror::Error;

/// Errors surfaced by the CLI.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no config directory\n  hint: pass --config or set TANDEM_CONFIG")]
    NoConfigDir,
}

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, Error>;
