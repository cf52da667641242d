//! Plugin option lookup.
//!
//! Three toggles control what the callback renders beyond the standard
//! narration. Defaults match the host's stock stdout behavior; each can be
//! overridden through the environment:
//!
//! | Option | Default | Environment variable |
//! |---|---|---|
//! | `show_custom_stats` | `false` | `COUNTER_ENABLED_SHOW_CUSTOM_STATS` |
//! | `display_skipped_hosts` | `true` | `COUNTER_ENABLED_DISPLAY_SKIPPED_HOSTS` |
//! | `display_args_to_stdout` | `false` | `COUNTER_ENABLED_DISPLAY_ARGS_TO_STDOUT` |
//!
//! Accepted boolean spellings are `1/0`, `true/false`, `yes/no`, `on/off`
//! (case-insensitive).

use std::env;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable for [`CounterEnabledOptions::show_custom_stats`].
pub const ENV_SHOW_CUSTOM_STATS: &str = "COUNTER_ENABLED_SHOW_CUSTOM_STATS";
/// Environment variable for [`CounterEnabledOptions::display_skipped_hosts`].
pub const ENV_DISPLAY_SKIPPED_HOSTS: &str = "COUNTER_ENABLED_DISPLAY_SKIPPED_HOSTS";
/// Environment variable for [`CounterEnabledOptions::display_args_to_stdout`].
pub const ENV_DISPLAY_ARGS_TO_STDOUT: &str = "COUNTER_ENABLED_DISPLAY_ARGS_TO_STDOUT";

/// Toggles for the counter-enabled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterEnabledOptions {
    /// Print the CUSTOM STATS section in the recap when tasks recorded any
    pub show_custom_stats: bool,
    /// Render `skipping:` lines for skipped hosts
    pub display_skipped_hosts: bool,
    /// Include task arguments in the task banner.
    ///
    /// Arguments can contain secrets the task's own no_log flag does not
    /// cover, so this stays off unless the operator opts in.
    pub display_args_to_stdout: bool,
}

impl Default for CounterEnabledOptions {
    fn default() -> Self {
        Self {
            show_custom_stats: false,
            display_skipped_hosts: true,
            display_args_to_stdout: false,
        }
    }
}

impl CounterEnabledOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options, applying environment overrides on top of defaults.
    pub fn from_env() -> Result<Self> {
        let mut options = Self::default();
        if let Some(value) = env_bool(ENV_SHOW_CUSTOM_STATS)? {
            options.show_custom_stats = value;
        }
        if let Some(value) = env_bool(ENV_DISPLAY_SKIPPED_HOSTS)? {
            options.display_skipped_hosts = value;
        }
        if let Some(value) = env_bool(ENV_DISPLAY_ARGS_TO_STDOUT)? {
            options.display_args_to_stdout = value;
        }
        Ok(options)
    }

    /// Set whether custom stats are printed in the recap.
    pub fn with_show_custom_stats(mut self, show: bool) -> Self {
        self.show_custom_stats = show;
        self
    }

    /// Set whether skipped hosts are rendered.
    pub fn with_display_skipped_hosts(mut self, display: bool) -> Self {
        self.display_skipped_hosts = display;
        self
    }

    /// Set whether task arguments appear in task banners.
    pub fn with_display_args_to_stdout(mut self, display: bool) -> Self {
        self.display_args_to_stdout = display;
        self
    }
}

/// Read one boolean environment variable, if set.
fn env_bool(key: &str) -> Result<Option<bool>> {
    match env::var(key) {
        Ok(raw) => parse_bool(key, &raw).map(Some),
        Err(_) => Ok(None),
    }
}

/// Parse a boolean toggle value.
fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::InvalidOption {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}
