//! Configuration loading from `.env` files.

use std::{env, path::PathBuf, time::Duration};

use anyhow::{Context, Result};

/// Relay URL seeded into the saved list on first run.
pub const DEFAULT_RELAY_URL: &str = "wss://ammetronics.com";

/// Collection window applied to subscriptions unless overridden.
pub const DEFAULT_COLLECT_WINDOW_MS: u64 = 2000;

/// Runtime settings derived from environment variables.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Path of the persisted relay list.
    pub relays_path: PathBuf,
    /// Relay URL seeded on first run.
    pub default_relay: String,
    /// How long a subscription collects events before it is cancelled.
    pub collect_window: Duration,
}

impl Settings {
    /// Load settings from the specified `.env` file.
    pub fn from_env(path: &str) -> Result<Self> {
        dotenvy::from_filename(path).context("reading env file")?;
        let relays_path =
            PathBuf::from(env::var("RELAYS_PATH").unwrap_or_else(|_| "relays.json".into()));
        let default_relay =
            env::var("DEFAULT_RELAY").unwrap_or_else(|_| DEFAULT_RELAY_URL.into());
        let window_ms = env::var("COLLECT_WINDOW_MS")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_COLLECT_WINDOW_MS);
        Ok(Self {
            relays_path,
            default_relay,
            collect_window: Duration::from_millis(window_ms),
        })
    }
}

/// Serializes tests that mutate process environment variables. `dotenvy`
/// never overrides variables that are already set, so each test clears them
/// while holding this lock.
#[cfg(test)]
pub(crate) static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
pub(crate) const ENV_VARS: [&str; 3] = ["RELAYS_PATH", "DEFAULT_RELAY", "COLLECT_WINDOW_MS"];
