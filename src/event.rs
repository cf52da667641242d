//! Host-supplied execution context for callback events.
//!
//! The orchestration host owns playbooks, plays, tasks, and results; a
//! stdout callback only ever sees them through the snapshot types in this
//! module. Each hook invocation hands the plugin the context it needs to
//! render a line of output and nothing more.
//!
//! ## Context Types
//!
//! - [`PlaybookInfo`]: the playbook being executed
//! - [`PlayInfo`]: a play, with its resolved host list and batch
//! - [`TaskInfo`]: one task, with metadata the plugin renders (name, args,
//!   path, no_log, loop flag)
//! - [`ResultInfo`]: the outcome of executing one task on one host
//! - [`HostResult`]: a per-host result event (host + task + result)

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

// ============================================================================
// Playbook Context
// ============================================================================

/// Information about the playbook being executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybookInfo {
    /// Name of the playbook
    pub name: String,
    /// Path to the playbook file (if loaded from disk)
    pub file_path: Option<PathBuf>,
    /// Number of plays in the playbook
    pub play_count: usize,
}

impl PlaybookInfo {
    /// Create a new PlaybookInfo.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_path: None,
            play_count: 0,
        }
    }

    /// Set the file path.
    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Set the play count.
    pub fn with_play_count(mut self, count: usize) -> Self {
        self.play_count = count;
        self
    }
}

// ============================================================================
// Play Context
// ============================================================================

/// Information about a play being executed.
///
/// `hosts` is the full resolved host list for the play; `batch` is the set
/// of hosts the play runs against concurrently (smaller than `hosts` when
/// serial execution is in effect).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayInfo {
    /// Name of the play (may be empty for unnamed plays)
    pub name: String,
    /// All resolved hosts for this play
    pub hosts: Vec<String>,
    /// The current batch of hosts executing concurrently
    pub batch: Vec<String>,
    /// Number of tasks in this play
    pub task_count: usize,
    /// Execution strategy for this play ("linear", "free", ...)
    pub strategy: Option<String>,
}

impl PlayInfo {
    /// Create a new PlayInfo.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hosts: Vec::new(),
            batch: Vec::new(),
            task_count: 0,
            strategy: None,
        }
    }

    /// Set the resolved hosts. The batch defaults to the full host list
    /// until [`with_batch`](Self::with_batch) narrows it.
    pub fn with_hosts(mut self, hosts: Vec<String>) -> Self {
        if self.batch.is_empty() {
            self.batch = hosts.clone();
        }
        self.hosts = hosts;
        self
    }

    /// Set the current host batch.
    pub fn with_batch(mut self, batch: Vec<String>) -> Self {
        self.batch = batch;
        self
    }

    /// Set the task count.
    pub fn with_task_count(mut self, count: usize) -> Self {
        self.task_count = count;
        self
    }

    /// Set the execution strategy.
    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }

    /// Whether this play runs under the free strategy, where hosts advance
    /// through tasks out of lockstep.
    pub fn is_free_strategy(&self) -> bool {
        self.strategy.as_deref() == Some("free")
    }
}

// ============================================================================
// Task Context
// ============================================================================

/// Information about a task being executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInfo {
    /// Task name
    pub name: String,
    /// Action plugin being executed
    pub action: String,
    /// Module arguments (sanitized by the host, secrets removed)
    #[serde(default)]
    pub args: IndexMap<String, JsonValue>,
    /// Unique task identifier (for banner correlation)
    pub uuid: Uuid,
    /// Source path of the task in the playbook tree
    pub path: Option<String>,
    /// Whether the task is marked no_log
    pub no_log: bool,
    /// Whether the task has loop items
    pub is_loop: bool,
}

impl TaskInfo {
    /// Create a new TaskInfo.
    pub fn new(name: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: action.into(),
            args: IndexMap::new(),
            uuid: Uuid::new_v4(),
            path: None,
            no_log: false,
            is_loop: false,
        }
    }

    /// Set the module arguments.
    pub fn with_args(mut self, args: IndexMap<String, JsonValue>) -> Self {
        self.args = args;
        self
    }

    /// Set the source path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Mark the task as no_log.
    pub fn with_no_log(mut self, no_log: bool) -> Self {
        self.no_log = no_log;
        self
    }

    /// Mark the task as a loop task.
    pub fn with_loop(mut self, is_loop: bool) -> Self {
        self.is_loop = is_loop;
        self
    }

    /// Whether this task is an include, whose per-host ok events the host
    /// narrates itself.
    pub fn is_include(&self) -> bool {
        self.action.starts_with("include") || self.action.starts_with("import")
    }
}

// ============================================================================
// Result Context
// ============================================================================

/// Status classification of a task execution, as decided by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Completed successfully with no changes
    Ok,
    /// Completed successfully and changed the target
    Changed,
    /// Failed on the target
    Failed,
    /// Skipped (condition not met)
    Skipped,
    /// Host could not be reached
    Unreachable,
}

/// Result of executing one loop item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResult {
    /// The loop item value
    pub item: JsonValue,
    /// Status of this item
    pub status: TaskStatus,
    /// Whether this item changed the target
    pub changed: bool,
    /// Message for this item (if any)
    pub msg: Option<String>,
}

impl ItemResult {
    /// Create an item result.
    pub fn new(item: JsonValue, status: TaskStatus) -> Self {
        Self {
            item,
            status,
            changed: matches!(status, TaskStatus::Changed),
            msg: None,
        }
    }

    /// Set the message.
    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = Some(msg.into());
        self
    }

    /// A short label for the item, used in `(item=...)` suffixes.
    pub fn label(&self) -> String {
        match &self.item {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Result information from executing a task on a host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultInfo {
    /// Task status
    pub status: TaskStatus,
    /// Whether something was changed
    pub changed: bool,
    /// Message from the task
    pub msg: Option<String>,
    /// Module-specific result payload
    #[serde(default)]
    pub data: IndexMap<String, JsonValue>,
    /// Per-item results for loop tasks
    #[serde(default)]
    pub items: Vec<ItemResult>,
    /// Warnings captured during execution
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Captured exception traceback (if the module crashed)
    pub exception: Option<String>,
    /// Host the task was delegated to (if delegated)
    pub delegated_host: Option<String>,
    /// Whether the host requested verbose rendering regardless of verbosity
    pub verbose_always: bool,
}

impl ResultInfo {
    fn with_status(status: TaskStatus) -> Self {
        Self {
            status,
            changed: matches!(status, TaskStatus::Changed),
            msg: None,
            data: IndexMap::new(),
            items: Vec::new(),
            warnings: Vec::new(),
            exception: None,
            delegated_host: None,
            verbose_always: false,
        }
    }

    /// Create an Ok result.
    pub fn ok() -> Self {
        Self::with_status(TaskStatus::Ok)
    }

    /// Create a Changed result.
    pub fn changed() -> Self {
        Self::with_status(TaskStatus::Changed)
    }

    /// Create a Failed result.
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::with_status(TaskStatus::Failed).with_msg(msg)
    }

    /// Create a Skipped result.
    pub fn skipped(msg: impl Into<String>) -> Self {
        Self::with_status(TaskStatus::Skipped).with_msg(msg)
    }

    /// Create an Unreachable result.
    pub fn unreachable(msg: impl Into<String>) -> Self {
        Self::with_status(TaskStatus::Unreachable).with_msg(msg)
    }

    /// Set the message.
    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = Some(msg.into());
        self
    }

    /// Set the result payload.
    pub fn with_data(mut self, data: IndexMap<String, JsonValue>) -> Self {
        self.data = data;
        self
    }

    /// Set the per-item results.
    pub fn with_items(mut self, items: Vec<ItemResult>) -> Self {
        self.items = items;
        self
    }

    /// Add a warning.
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    /// Set the captured exception.
    pub fn with_exception(mut self, exception: impl Into<String>) -> Self {
        self.exception = Some(exception.into());
        self
    }

    /// Set the delegated host.
    pub fn with_delegated_host(mut self, host: impl Into<String>) -> Self {
        self.delegated_host = Some(host.into());
        self
    }

    /// Request verbose rendering regardless of display verbosity.
    pub fn with_verbose_always(mut self, verbose_always: bool) -> Self {
        self.verbose_always = verbose_always;
        self
    }

    /// Render the result payload as one-line JSON for `=> {...}` suffixes.
    ///
    /// The dump carries the changed flag, the message (when present), and
    /// the module payload; internal fields (warnings, exception, delegation
    /// bookkeeping) are surfaced through dedicated display helpers instead.
    pub fn dump(&self) -> String {
        let mut map = serde_json::Map::new();
        map.insert("changed".to_string(), JsonValue::Bool(self.changed));
        if let Some(msg) = &self.msg {
            map.insert("msg".to_string(), JsonValue::String(msg.clone()));
        }
        for (k, v) in &self.data {
            map.insert(k.clone(), v.clone());
        }
        serde_json::to_string(&JsonValue::Object(map)).unwrap_or_default()
    }
}

// ============================================================================
// Per-Host Result Event
// ============================================================================

/// A per-host result event: the host, the task that ran, and its outcome.
///
/// This is the payload of the ok/failed/skipped/unreachable hooks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostResult {
    /// The host this result belongs to
    pub host: String,
    /// The task that produced the result
    pub task: TaskInfo,
    /// The result itself
    pub result: ResultInfo,
}

impl HostResult {
    /// Create a new per-host result event.
    pub fn new(host: impl Into<String>, task: TaskInfo, result: ResultInfo) -> Self {
        Self {
            host: host.into(),
            task,
            result,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
