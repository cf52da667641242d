//! Aggregate run statistics delivered with the recap event.
//!
//! The host accumulates these counters during execution and hands the
//! finished [`RunStats`] to stdout callbacks when the run ends. The plugin
//! only reads them; the increment API exists so the host (and tests) can
//! build the aggregate.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Reserved custom-stats key holding the per-run aggregate bucket.
pub const RUN_BUCKET: &str = "_run";

/// Per-host counter fields tracked by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatField {
    /// Successful, unchanged executions
    Ok,
    /// Executions that changed the target
    Changed,
    /// Unreachable attempts
    Dark,
    /// Failed executions
    Failures,
    /// Skipped executions
    Skipped,
    /// Failures recovered by a rescue block
    Rescued,
    /// Failures ignored via ignore_errors
    Ignored,
}

/// Summary of one host's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSummary {
    /// Successful, unchanged executions
    pub ok: u32,
    /// Executions that changed the target
    pub changed: u32,
    /// Unreachable attempts
    pub unreachable: u32,
    /// Failed executions
    pub failures: u32,
    /// Skipped executions
    pub skipped: u32,
    /// Failures recovered by a rescue block
    pub rescued: u32,
    /// Failures ignored via ignore_errors
    pub ignored: u32,
}

impl HostSummary {
    /// Whether the host saw any failure or unreachable attempt.
    pub fn has_failures(&self) -> bool {
        self.failures > 0 || self.unreachable > 0
    }

    /// Whether the host saw any change.
    pub fn has_changes(&self) -> bool {
        self.changed > 0
    }
}

/// Aggregate statistics for an entire playbook run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    summaries: HashMap<String, HostSummary>,
    /// Custom statistics set by tasks, keyed by host name plus the
    /// [`RUN_BUCKET`] aggregate.
    #[serde(default)]
    pub custom: HashMap<String, JsonValue>,
}

impl RunStats {
    /// Create empty run statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment one counter field for a host, creating the host entry on
    /// first use.
    pub fn increment(&mut self, field: StatField, host: &str) {
        let summary = self.summaries.entry(host.to_string()).or_default();
        match field {
            StatField::Ok => summary.ok += 1,
            StatField::Changed => summary.changed += 1,
            StatField::Dark => summary.unreachable += 1,
            StatField::Failures => summary.failures += 1,
            StatField::Skipped => summary.skipped += 1,
            StatField::Rescued => summary.rescued += 1,
            StatField::Ignored => summary.ignored += 1,
        }
    }

    /// All hosts that produced at least one result, in lexicographic order.
    pub fn processed_hosts(&self) -> Vec<String> {
        let mut hosts: Vec<String> = self.summaries.keys().cloned().collect();
        hosts.sort();
        hosts
    }

    /// Summarize one host's counters. Unknown hosts summarize to zeros.
    pub fn summarize(&self, host: &str) -> HostSummary {
        self.summaries.get(host).copied().unwrap_or_default()
    }

    /// Set a custom statistic for a host (or for the whole run via
    /// [`RUN_BUCKET`]).
    pub fn set_custom(&mut self, scope: impl Into<String>, value: JsonValue) {
        self.custom.insert(scope.into(), value);
    }

    /// Whether any custom statistics were recorded.
    pub fn has_custom(&self) -> bool {
        !self.custom.is_empty()
    }
}
