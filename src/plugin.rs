//! The callback plugin contract dispatched by the host.
//!
//! The host invokes these hooks synchronously, one at a time, as lifecycle
//! events occur during a playbook run. Every hook has a no-op default so a
//! plugin only implements the events it cares about.

use async_trait::async_trait;

use crate::event::{HostResult, ItemResult, PlayInfo, PlaybookInfo, TaskInfo};
use crate::stats::RunStats;

/// Version of the callback API this crate implements.
pub const CALLBACK_API_VERSION: &str = "2.0";

/// Kind of callback plugin, used by the host to decide dispatch rules
/// (only one stdout plugin narrates a run).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackType {
    /// Narrates the run on the console; at most one is active
    Stdout,
    /// Aggregates or records events alongside the stdout plugin
    Aggregate,
    /// Sends events to an external system
    Notification,
}

/// Hook contract for receiving playbook execution events.
#[async_trait]
pub trait CallbackPlugin: Send + Sync {
    /// Identifier the host uses to select this plugin.
    fn callback_name(&self) -> &'static str;

    /// The kind of plugin this is.
    fn callback_type(&self) -> CallbackType {
        CallbackType::Stdout
    }

    /// The callback API version this plugin targets.
    fn callback_version(&self) -> &'static str {
        CALLBACK_API_VERSION
    }

    /// A playbook run is starting.
    async fn on_playbook_start(&self, playbook: &PlaybookInfo) {
        let _ = playbook;
    }

    /// A play is starting.
    async fn on_play_start(&self, play: &PlayInfo) {
        let _ = play;
    }

    /// A task is starting (first host to reach it under linear strategy).
    async fn on_task_start(&self, task: &TaskInfo, is_conditional: bool) {
        let _ = (task, is_conditional);
    }

    /// A task completed successfully on one host (ok or changed).
    async fn on_task_ok(&self, result: &HostResult) {
        let _ = result;
    }

    /// A task failed on one host.
    async fn on_task_failed(&self, result: &HostResult, ignore_errors: bool) {
        let _ = (result, ignore_errors);
    }

    /// A task was skipped on one host.
    async fn on_task_skipped(&self, result: &HostResult) {
        let _ = result;
    }

    /// A host was unreachable for a task.
    async fn on_task_unreachable(&self, result: &HostResult) {
        let _ = result;
    }

    /// One loop item completed successfully on a host.
    async fn on_item_ok(&self, result: &HostResult, item: &ItemResult) {
        let _ = (result, item);
    }

    /// One loop item failed on a host.
    async fn on_item_failed(&self, result: &HostResult, item: &ItemResult) {
        let _ = (result, item);
    }

    /// One loop item was skipped on a host.
    async fn on_item_skipped(&self, result: &HostResult, item: &ItemResult) {
        let _ = (result, item);
    }

    /// The run finished; final statistics are available.
    async fn on_stats(&self, stats: &RunStats) {
        let _ = stats;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ResultInfo;

    /// A plugin that overrides nothing, to exercise the default hooks.
    struct InertPlugin;

    impl CallbackPlugin for InertPlugin {
        fn callback_name(&self) -> &'static str {
            "inert"
        }
    }

    #[tokio::test]
    async fn test_default_hooks_are_noops() {
        let plugin = InertPlugin;
        assert_eq!(plugin.callback_type(), CallbackType::Stdout);
        assert_eq!(plugin.callback_version(), CALLBACK_API_VERSION);

        // None of these should panic or require state.
        plugin.on_playbook_start(&PlaybookInfo::new("pb")).await;
        plugin.on_play_start(&PlayInfo::new("play")).await;
        let task = TaskInfo::new("t", "debug");
        plugin.on_task_start(&task, false).await;
        let result = HostResult::new("h", task, ResultInfo::ok());
        plugin.on_task_ok(&result).await;
        plugin.on_stats(&RunStats::new()).await;
    }
}
