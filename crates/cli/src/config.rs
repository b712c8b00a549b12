// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Config file resolution for the CLI.
//!
//! The file is taken from `--config`, else `$TANDEM_CONFIG`, else
//! `<config dir>/tandem/config.toml`. A missing file means defaults.
//! `TANDEM_SYNC_URL` overrides the `url` key.

use std::path::{Path, PathBuf};

use tandem_client::ClientConfig;

use crate::env;
use crate::error::{Error, Result};

const APP_DIR_NAME: &str = "tandem";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Path of the config file in effect.
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    resolve_path(
        explicit.map(Path::to_path_buf),
        env::config_file(),
        dirs::config_dir(),
    )
}

fn resolve_path(
    explicit: Option<PathBuf>,
    from_env: Option<PathBuf>,
    config_dir: Option<PathBuf>,
) -> Result<PathBuf> {
    explicit
        .or(from_env)
        .or_else(|| config_dir.map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME)))
        .ok_or(Error::NoConfigDir)
}

/// Loads the config in effect, with environment overrides applied before
/// validation.
pub fn load(explicit: Option<&Path>) -> Result<ClientConfig> {
    load_with(&config_path(explicit)?, env::sync_url())
}

fn load_with(path: &Path, sync_url: Option<String>) -> Result<ClientConfig> {
    tracing::debug!(path = %path.display(), "loading config");
    let config = apply_overrides(ClientConfig::read(path)?, sync_url);
    config.validate()?;
    Ok(config)
}

fn apply_overrides(mut config: ClientConfig, sync_url: Option<String>) -> ClientConfig {
    if let Some(url) = sync_url {
        config.url = Some(url);
    }
    config
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
