// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All runtime environment variables used by the CLI are defined here
//! with typed accessor functions. The variable name constants are generated
//! by `build.rs` and live in the [`vars`] submodule.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

/// Returns the value of `TANDEM_CONFIG` if set.
pub fn config_file() -> Option<PathBuf> {
    non_empty(vars::TANDEM_CONFIG).map(PathBuf::from)
}

/// Returns the value of `TANDEM_SYNC_URL` if set.
pub fn sync_url() -> Option<String> {
    non_empty(vars::TANDEM_SYNC_URL)
}

/// Returns the bearer credential from `TANDEM_TOKEN` if set.
pub fn token() -> Option<String> {
    non_empty(vars::TANDEM_TOKEN)
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
