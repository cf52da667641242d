//! The counter-enabled stdout callback.
//!
//! Decorates the standard run narration with running counters so large
//! inventories get a progress-bar feel: every task banner carries
//! `task N / task total` and every per-host result line carries
//! `host N / host total`.
//!
//! # Example Output
//!
//! ```text
//! PLAY [Configure webservers] ****************************************************
//!
//! TASK 1/5 [Install nginx] *******************************************************
//! changed: 1/3 [web1]
//! ok: 2/3 [web2]
//! changed: 3/3 [web3 -> proxy1]
//!
//! PLAY RECAP *********************************************************************
//! web1                       : ok=4 changed=1 unreachable=0 failed=0 rescued=0 ignored=0
//! ```
//!
//! Host numbering keeps increasing across sequential plays: the counter is
//! re-based on the cumulative batch total at each task start, so a host's
//! position in the whole run stays visible. Under the free strategy hosts
//! advance out of lockstep, which makes both counters approximations; when
//! a result arrives for a task whose banner has not been shown yet, the
//! banner is printed retroactively.

use colored::Color;
use parking_lot::RwLock;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use async_trait::async_trait;

use crate::config::CounterEnabledOptions;
use crate::display::{colorize, hostcolor, Display, DisplayOptions};
use crate::event::{HostResult, ItemResult, PlayInfo, PlaybookInfo, ResultInfo, TaskInfo, TaskStatus};
use crate::plugin::CallbackPlugin;
use crate::stats::{RunStats, RUN_BUCKET};

// Status colors, matching the host's stock stdout palette.
const COLOR_OK: Color = Color::Green;
const COLOR_CHANGED: Color = Color::Yellow;
const COLOR_ERROR: Color = Color::Red;
const COLOR_SKIP: Color = Color::Cyan;
const COLOR_UNREACHABLE: Color = Color::BrightRed;
const COLOR_DEBUG: Color = Color::BrightBlack;

// ============================================================================
// Counter State
// ============================================================================

/// The handful of integers the plugin tracks between events.
#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    /// 1-based index of the task being started, reset at play start
    task_counter: usize,
    /// Task count of the current play
    task_total: usize,
    /// Per-host result count, re-based at each task start
    host_counter: usize,
    /// Resolved host count of the current play
    host_total: usize,
    /// Cumulative batch size including the current play
    current_batch_total: usize,
    /// Cumulative batch size before the current play
    previous_batch_total: usize,
}

// ============================================================================
// The Plugin
// ============================================================================

/// Stdout callback that adds task and host counters to run output.
///
/// All state is behind `RwLock` so the hook methods can take `&self`; the
/// host delivers events one at a time, so the locks are uncontended.
#[derive(Debug)]
pub struct CounterEnabledCallback {
    options: CounterEnabledOptions,
    display: Display,
    counters: RwLock<Counters>,
    playbook: RwLock<Option<PlaybookInfo>>,
    play: RwLock<Option<PlayInfo>>,
    /// Uuid of the last task whose banner was printed, for the
    /// free-strategy retro-banner case.
    last_task_banner: RwLock<Option<Uuid>>,
}

impl CounterEnabledCallback {
    /// Create the callback with default options, writing to stdout.
    pub fn new() -> Self {
        Self::with_options(CounterEnabledOptions::default())
    }

    /// Create the callback with explicit options.
    pub fn with_options(options: CounterEnabledOptions) -> Self {
        Self {
            options,
            display: Display::new(),
            counters: RwLock::new(Counters::default()),
            playbook: RwLock::new(None),
            play: RwLock::new(None),
            last_task_banner: RwLock::new(None),
        }
    }

    /// Replace the display service (custom sink, verbosity, color).
    pub fn with_display(mut self, display: Display) -> Self {
        self.display = display;
        self
    }

    /// Get a builder for fluent configuration.
    pub fn builder() -> CounterEnabledCallbackBuilder {
        CounterEnabledCallbackBuilder::new()
    }

    // ========================================================================
    // Rendering Helpers
    // ========================================================================

    /// `[host]`, or `[host -> delegate]` when the result was delegated.
    fn host_label(result: &HostResult) -> String {
        match &result.result.delegated_host {
            Some(delegate) => format!("[{} -> {}]", result.host, delegate),
            None => format!("[{}]", result.host),
        }
    }

    /// Whether result details should be appended to the status line.
    fn run_is_verbose(&self, result: &HostResult) -> bool {
        result.result.verbose_always || (self.display.verbosity() >= 1 && !result.task.no_log)
    }

    /// Advance the host counter and return `(counter, total)` for display.
    fn bump_host_counter(&self) -> (usize, usize) {
        let mut counters = self.counters.write();
        counters.host_counter += 1;
        (counters.host_counter, counters.host_total)
    }

    /// Banner text for a task: `TASK n/total [name args]`.
    ///
    /// Arguments appear only when the task is not no_log and the operator
    /// opted in; the no_log check here cannot cover argument-spec no_log,
    /// which only the target side knows about.
    fn task_banner_text(&self, task: &TaskInfo, index: usize, total: usize) -> String {
        let args = if !task.no_log && self.options.display_args_to_stdout && !task.args.is_empty()
        {
            let rendered: Vec<String> = task
                .args
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect();
            format!(" {}", rendered.join(", "))
        } else {
            String::new()
        };
        format!("TASK {index}/{total} [{}{args}]", task.name.trim())
    }

    /// Print a task banner (and its source path at -vv) and remember which
    /// task it was for.
    fn print_task_banner(&self, task: &TaskInfo, index: usize, total: usize) {
        self.display
            .banner(&self.task_banner_text(task, index, total));
        if self.display.verbosity() >= 2 {
            if let Some(path) = &task.path {
                self.display.display(
                    &format!("task path: {path}"),
                    DisplayOptions::color(COLOR_DEBUG),
                );
            }
        }
        *self.last_task_banner.write() = Some(task.uuid);
    }

    /// Under the free strategy results can arrive for a task whose banner
    /// has not been shown; print it retroactively. The index shown is the
    /// current task position, which is only an approximation out of
    /// lockstep.
    fn reprint_banner_if_needed(&self, task: &TaskInfo) {
        let free = self
            .play
            .read()
            .as_ref()
            .is_some_and(PlayInfo::is_free_strategy);
        if !free {
            return;
        }
        if *self.last_task_banner.read() == Some(task.uuid) {
            return;
        }
        let (index, total) = {
            let counters = self.counters.read();
            (counters.task_counter.saturating_sub(1).max(1), counters.task_total)
        };
        self.print_task_banner(task, index, total);
    }

    /// Surface warnings captured in the result payload.
    fn handle_warnings(&self, result: &ResultInfo) {
        for warning in &result.warnings {
            self.display.warning(warning);
        }
    }

    /// Surface a captured module exception, truncated below -vvv.
    fn handle_exception(&self, result: &ResultInfo) {
        let Some(exception) = &result.exception else {
            return;
        };
        let msg = if self.display.verbosity() < 3 {
            let last_line = exception.lines().last().unwrap_or(exception.as_str());
            format!(
                "An exception occurred during task execution. \
                 To see the full traceback, use -vvv. The error was: {last_line}"
            )
        } else {
            format!("An exception occurred during task execution. The full traceback is:\n{exception}")
        };
        self.display.display(&msg, DisplayOptions::color(COLOR_ERROR));
    }

    /// Render one loop item line. Item lines carry no counters; the
    /// summary counters already advanced for the host as a whole.
    fn render_item(&self, result: &HostResult, item: &ItemResult) {
        let label = Self::host_label(result);
        match item.status {
            TaskStatus::Failed => {
                let detail = item.msg.clone().unwrap_or_default();
                self.display.display(
                    &format!("failed: {label} (item={}) => {detail}", item.label()),
                    DisplayOptions::color(COLOR_ERROR),
                );
            }
            TaskStatus::Unreachable => {
                let detail = item.msg.clone().unwrap_or_default();
                self.display.display(
                    &format!("fatal: {label} (item={}): UNREACHABLE! => {detail}", item.label()),
                    DisplayOptions::color(COLOR_UNREACHABLE),
                );
            }
            TaskStatus::Skipped => {
                if self.options.display_skipped_hosts {
                    self.display.display(
                        &format!("skipping: {label} (item={})", item.label()),
                        DisplayOptions::color(COLOR_SKIP),
                    );
                }
            }
            TaskStatus::Ok | TaskStatus::Changed => {
                let (word, color) = if item.changed {
                    ("changed", COLOR_CHANGED)
                } else {
                    ("ok", COLOR_OK)
                };
                self.display.display(
                    &format!("{word}: {label} (item={})", item.label()),
                    DisplayOptions::color(color),
                );
            }
        }
    }

    /// Itemized results render per item instead of as one summary line.
    fn process_items(&self, result: &HostResult) {
        for item in &result.result.items {
            self.render_item(result, item);
        }
    }

    /// One-line rendering of a custom-stats value.
    fn dump_custom(value: &JsonValue) -> String {
        serde_json::to_string(value).unwrap_or_default().replace('\n', "")
    }
}

impl Default for CounterEnabledCallback {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// CallbackPlugin Implementation
// ============================================================================

#[async_trait]
impl CallbackPlugin for CounterEnabledCallback {
    fn callback_name(&self) -> &'static str {
        "counter_enabled"
    }

    async fn on_playbook_start(&self, playbook: &PlaybookInfo) {
        *self.playbook.write() = Some(playbook.clone());
    }

    async fn on_play_start(&self, play: &PlayInfo) {
        let name = play.name.trim();
        let msg = if name.is_empty() {
            "play".to_string()
        } else {
            format!("PLAY [{name}]")
        };
        self.display.banner(&msg);

        {
            let mut counters = self.counters.write();
            counters.previous_batch_total = counters.current_batch_total;
            counters.current_batch_total += play.batch.len();
            counters.host_total = play.hosts.len();
            counters.task_total = play.task_count;
            counters.task_counter = 1;
        }
        *self.play.write() = Some(play.clone());
    }

    async fn on_task_start(&self, task: &TaskInfo, _is_conditional: bool) {
        let (index, total) = {
            let counters = self.counters.read();
            (counters.task_counter, counters.task_total)
        };
        self.print_task_banner(task, index, total);

        let mut counters = self.counters.write();
        counters.host_counter = counters.previous_batch_total;
        counters.task_counter += 1;
    }

    async fn on_task_ok(&self, result: &HostResult) {
        let (counter, total) = self.bump_host_counter();
        self.reprint_banner_if_needed(&result.task);

        // Include results are narrated by the host itself.
        if result.task.is_include() {
            return;
        }

        self.handle_warnings(&result.result);

        if result.task.is_loop && !result.result.items.is_empty() {
            self.process_items(result);
            return;
        }

        let (word, color) = if result.result.changed {
            ("changed", COLOR_CHANGED)
        } else {
            ("ok", COLOR_OK)
        };
        let mut msg = format!("{word}: {counter}/{total} {}", Self::host_label(result));
        if self.run_is_verbose(result) {
            msg.push_str(&format!(" => {}", result.result.dump()));
        }
        self.display.display(&msg, DisplayOptions::color(color));
    }

    async fn on_task_failed(&self, result: &HostResult, ignore_errors: bool) {
        let (counter, total) = self.bump_host_counter();
        self.reprint_banner_if_needed(&result.task);

        self.handle_exception(&result.result);
        self.handle_warnings(&result.result);

        if result.task.is_loop && !result.result.items.is_empty() {
            self.process_items(result);
        } else {
            self.display.display(
                &format!(
                    "fatal: {counter}/{total} {}: FAILED! => {}",
                    Self::host_label(result),
                    result.result.dump()
                ),
                DisplayOptions::color(COLOR_ERROR),
            );
        }

        if ignore_errors {
            self.display
                .display("...ignoring", DisplayOptions::color(COLOR_SKIP));
        }
    }

    async fn on_task_skipped(&self, result: &HostResult) {
        // The counter advances even when the line is suppressed, so host
        // numbering stays consistent with the other result variants.
        let (counter, total) = self.bump_host_counter();

        if !self.options.display_skipped_hosts {
            return;
        }

        self.reprint_banner_if_needed(&result.task);

        if result.task.is_loop && !result.result.items.is_empty() {
            self.process_items(result);
            return;
        }

        let mut msg = format!("skipping: {counter}/{total} {}", Self::host_label(result));
        if self.run_is_verbose(result) {
            msg.push_str(&format!(" => {}", result.result.dump()));
        }
        self.display.display(&msg, DisplayOptions::color(COLOR_SKIP));
    }

    async fn on_task_unreachable(&self, result: &HostResult) {
        let (counter, total) = self.bump_host_counter();
        self.reprint_banner_if_needed(&result.task);

        self.display.display(
            &format!(
                "fatal: {counter}/{total} {}: UNREACHABLE! => {}",
                Self::host_label(result),
                result.result.dump()
            ),
            DisplayOptions::color(COLOR_UNREACHABLE),
        );
    }

    async fn on_item_ok(&self, result: &HostResult, item: &ItemResult) {
        self.render_item(result, item);
    }

    async fn on_item_failed(&self, result: &HostResult, item: &ItemResult) {
        self.render_item(result, item);
    }

    async fn on_item_skipped(&self, result: &HostResult, item: &ItemResult) {
        self.render_item(result, item);
    }

    async fn on_stats(&self, stats: &RunStats) {
        self.display.banner("PLAY RECAP");

        let use_color = self.display.use_color();
        let screen_color = |color: Color| use_color.then_some(color);

        for host in stats.processed_hosts() {
            let summary = stats.summarize(&host);

            // Colorized rendering for the interactive screen.
            let screen_line = format!(
                "{} : {} {} {} {} {} {}",
                hostcolor(&host, &summary, use_color),
                colorize("ok", summary.ok, screen_color(COLOR_OK)),
                colorize("changed", summary.changed, screen_color(COLOR_CHANGED)),
                colorize("unreachable", summary.unreachable, screen_color(COLOR_UNREACHABLE)),
                colorize("failed", summary.failures, screen_color(COLOR_ERROR)),
                colorize("rescued", summary.rescued, screen_color(COLOR_OK)),
                colorize("ignored", summary.ignored, screen_color(Color::BrightMagenta)),
            );
            self.display
                .display(&screen_line, DisplayOptions::screen_only(None));

            // Plain rendering for the persisted run log.
            let log_line = format!(
                "{} : {} {} {} {} {} {}",
                hostcolor(&host, &summary, false),
                colorize("ok", summary.ok, None),
                colorize("changed", summary.changed, None),
                colorize("unreachable", summary.unreachable, None),
                colorize("failed", summary.failures, None),
                colorize("rescued", summary.rescued, None),
                colorize("ignored", summary.ignored, None),
            );
            self.display.display(&log_line, DisplayOptions::log_only());
        }

        self.display.display("", DisplayOptions::screen_only(None));

        if self.options.show_custom_stats && stats.has_custom() {
            self.display.banner("CUSTOM STATS: ");

            let mut scopes: Vec<&String> = stats
                .custom
                .keys()
                .filter(|scope| scope.as_str() != RUN_BUCKET)
                .collect();
            scopes.sort();
            for scope in scopes {
                if let Some(value) = stats.custom.get(scope) {
                    self.display.display(
                        &format!("\t{scope}: {}", Self::dump_custom(value)),
                        DisplayOptions::default(),
                    );
                }
            }

            if let Some(run) = stats.custom.get(RUN_BUCKET) {
                self.display.display("", DisplayOptions::screen_only(None));
                self.display.display(
                    &format!("\tRUN: {}", Self::dump_custom(run)),
                    DisplayOptions::default(),
                );
            }
            self.display.display("", DisplayOptions::screen_only(None));
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`CounterEnabledCallback`].
#[derive(Debug, Default)]
pub struct CounterEnabledCallbackBuilder {
    options: CounterEnabledOptions,
    display: Option<Display>,
}

impl CounterEnabledCallbackBuilder {
    /// Create a builder with default options.
    pub fn new() -> Self {
        Self {
            options: CounterEnabledOptions::default(),
            display: None,
        }
    }

    /// Use a full options value.
    pub fn options(mut self, options: CounterEnabledOptions) -> Self {
        self.options = options;
        self
    }

    /// Set whether custom stats are printed in the recap.
    pub fn show_custom_stats(mut self, show: bool) -> Self {
        self.options.show_custom_stats = show;
        self
    }

    /// Set whether skipped hosts are rendered.
    pub fn display_skipped_hosts(mut self, display: bool) -> Self {
        self.options.display_skipped_hosts = display;
        self
    }

    /// Set whether task arguments appear in task banners.
    pub fn display_args_to_stdout(mut self, display: bool) -> Self {
        self.options.display_args_to_stdout = display;
        self
    }

    /// Use a custom display service.
    pub fn display(mut self, display: Display) -> Self {
        self.display = Some(display);
        self
    }

    /// Build the callback.
    pub fn build(self) -> CounterEnabledCallback {
        let callback = CounterEnabledCallback::with_options(self.options);
        match self.display {
            Some(display) => callback.with_display(display),
            None => callback,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::CallbackType;
    use indexmap::IndexMap;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::io::{self, Write};
    use std::sync::Arc;

    /// Shared capture sink for asserting on rendered output.
    #[derive(Clone, Default)]
    struct CaptureBuffer(Arc<Mutex<Vec<u8>>>);

    impl CaptureBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).to_string()
        }

        fn lines(&self) -> Vec<String> {
            self.contents().lines().map(str::to_string).collect()
        }
    }

    impl Write for CaptureBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn test_callback(options: CounterEnabledOptions) -> (CounterEnabledCallback, CaptureBuffer) {
        let buffer = CaptureBuffer::default();
        let display = Display::with_writer(Box::new(buffer.clone()));
        let callback = CounterEnabledCallback::builder()
            .options(options)
            .display(display)
            .build();
        (callback, buffer)
    }

    fn play(name: &str, hosts: &[&str], task_count: usize) -> PlayInfo {
        PlayInfo::new(name)
            .with_hosts(hosts.iter().map(|h| h.to_string()).collect())
            .with_task_count(task_count)
    }

    fn ok_result(host: &str, task: &TaskInfo) -> HostResult {
        HostResult::new(host, task.clone(), ResultInfo::ok())
    }

    #[test]
    fn test_versioning_markers() {
        let callback = CounterEnabledCallback::new();
        assert_eq!(callback.callback_name(), "counter_enabled");
        assert_eq!(callback.callback_type(), CallbackType::Stdout);
        assert_eq!(callback.callback_version(), "2.0");
    }

    #[tokio::test]
    async fn test_task_counter_starts_at_one_and_increments() {
        let (callback, buffer) = test_callback(CounterEnabledOptions::default());
        callback.on_play_start(&play("deploy", &["web1"], 2)).await;

        callback
            .on_task_start(&TaskInfo::new("first", "debug"), false)
            .await;
        callback
            .on_task_start(&TaskInfo::new("second", "debug"), false)
            .await;

        let output = buffer.contents();
        assert!(output.contains("TASK 1/2 [first]"));
        assert!(output.contains("TASK 2/2 [second]"));
    }

    #[tokio::test]
    async fn test_task_counter_resets_per_play() {
        let (callback, buffer) = test_callback(CounterEnabledOptions::default());

        callback.on_play_start(&play("one", &["web1"], 1)).await;
        callback
            .on_task_start(&TaskInfo::new("a", "debug"), false)
            .await;

        callback.on_play_start(&play("two", &["web1"], 1)).await;
        callback
            .on_task_start(&TaskInfo::new("b", "debug"), false)
            .await;

        let output = buffer.contents();
        assert!(output.contains("TASK 1/1 [a]"));
        assert!(output.contains("TASK 1/1 [b]"));
    }

    #[tokio::test]
    async fn test_host_counter_counts_within_task() {
        let (callback, buffer) = test_callback(CounterEnabledOptions::default());
        callback
            .on_play_start(&play("deploy", &["web1", "web2"], 1))
            .await;

        let task = TaskInfo::new("install", "package");
        callback.on_task_start(&task, false).await;
        callback.on_task_ok(&ok_result("web1", &task)).await;
        callback.on_task_ok(&ok_result("web2", &task)).await;

        let output = buffer.contents();
        assert!(output.contains("ok: 1/2 [web1]"));
        assert!(output.contains("ok: 2/2 [web2]"));
    }

    #[tokio::test]
    async fn test_host_counter_carries_batch_total_across_plays() {
        let (callback, buffer) = test_callback(CounterEnabledOptions::default());

        let first = play("one", &["web1", "web2"], 1);
        callback.on_play_start(&first).await;
        let task_a = TaskInfo::new("a", "debug");
        callback.on_task_start(&task_a, false).await;
        callback.on_task_ok(&ok_result("web1", &task_a)).await;
        callback.on_task_ok(&ok_result("web2", &task_a)).await;

        // Second play: numbering continues from the prior batch total.
        let second = play("two", &["db1"], 1);
        callback.on_play_start(&second).await;
        let task_b = TaskInfo::new("b", "debug");
        callback.on_task_start(&task_b, false).await;
        callback.on_task_ok(&ok_result("db1", &task_b)).await;

        assert!(buffer.contents().contains("ok: 3/1 [db1]"));
    }

    #[tokio::test]
    async fn test_delegated_result_renders_arrow_suffix() {
        let (callback, buffer) = test_callback(CounterEnabledOptions::default());
        callback.on_play_start(&play("deploy", &["web1"], 1)).await;

        let task = TaskInfo::new("rsync", "synchronize");
        callback.on_task_start(&task, false).await;
        let result = HostResult::new(
            "web1",
            task.clone(),
            ResultInfo::changed().with_delegated_host("proxy1"),
        );
        callback.on_task_ok(&result).await;

        let output = buffer.contents();
        assert!(output.contains("changed: 1/1 [web1 -> proxy1]"));
        assert!(!output.contains("[web1]\n"));
    }

    #[tokio::test]
    async fn test_skipped_line_suppressed_but_counter_advances() {
        let options = CounterEnabledOptions::default().with_display_skipped_hosts(false);
        let (callback, buffer) = test_callback(options);
        callback
            .on_play_start(&play("deploy", &["web1", "web2"], 1))
            .await;

        let task = TaskInfo::new("maybe", "command");
        callback.on_task_start(&task, false).await;
        let skipped = HostResult::new("web1", task.clone(), ResultInfo::skipped("condition"));
        callback.on_task_skipped(&skipped).await;
        callback.on_task_ok(&ok_result("web2", &task)).await;

        let output = buffer.contents();
        assert!(!output.contains("skipping:"));
        // The skip still consumed slot 1.
        assert!(output.contains("ok: 2/2 [web2]"));
    }

    #[tokio::test]
    async fn test_skipped_line_shown_by_default() {
        let (callback, buffer) = test_callback(CounterEnabledOptions::default());
        callback.on_play_start(&play("deploy", &["web1"], 1)).await;

        let task = TaskInfo::new("maybe", "command");
        callback.on_task_start(&task, false).await;
        let skipped = HostResult::new("web1", task, ResultInfo::skipped("condition"));
        callback.on_task_skipped(&skipped).await;

        assert!(buffer.contents().contains("skipping: 1/1 [web1]"));
    }

    #[tokio::test]
    async fn test_unnamed_play_uses_placeholder_banner() {
        let (callback, buffer) = test_callback(CounterEnabledOptions::default());
        callback.on_play_start(&play("  ", &["web1"], 1)).await;

        let lines = buffer.lines();
        assert!(lines.iter().any(|l| l.starts_with("play *")));
        assert!(!buffer.contents().contains("PLAY ["));
    }

    #[tokio::test]
    async fn test_include_result_renders_no_line() {
        let (callback, buffer) = test_callback(CounterEnabledOptions::default());
        callback.on_play_start(&play("deploy", &["web1"], 2)).await;

        let include = TaskInfo::new("load more", "include_tasks");
        callback.on_task_start(&include, false).await;
        callback.on_task_ok(&ok_result("web1", &include)).await;
        assert!(!buffer.contents().contains("ok:"));

        // A regular task afterwards renders normally.
        let task = TaskInfo::new("real", "debug");
        callback.on_task_start(&task, false).await;
        callback.on_task_ok(&ok_result("web1", &task)).await;
        assert!(buffer.contents().contains("ok: 1/1 [web1]"));
    }

    #[tokio::test]
    async fn test_failed_with_ignore_errors() {
        let (callback, buffer) = test_callback(CounterEnabledOptions::default());
        callback.on_play_start(&play("deploy", &["web1"], 1)).await;

        let task = TaskInfo::new("risky", "command");
        callback.on_task_start(&task, false).await;
        let failed = HostResult::new("web1", task, ResultInfo::failed("exit code 2"));
        callback.on_task_failed(&failed, true).await;

        let output = buffer.contents();
        assert!(output.contains("fatal: 1/1 [web1]: FAILED! =>"));
        assert!(output.contains("\"msg\":\"exit code 2\""));
        assert!(output.contains("...ignoring"));
    }

    #[tokio::test]
    async fn test_unreachable_renders_fatal_line() {
        let (callback, buffer) = test_callback(CounterEnabledOptions::default());
        callback.on_play_start(&play("deploy", &["web1"], 1)).await;

        let task = TaskInfo::new("ping", "ping");
        callback.on_task_start(&task, false).await;
        let unreachable = HostResult::new(
            "web1",
            task,
            ResultInfo::unreachable("Failed to connect to the host via ssh"),
        );
        callback.on_task_unreachable(&unreachable).await;

        assert!(buffer
            .contents()
            .contains("fatal: 1/1 [web1]: UNREACHABLE! =>"));
    }

    #[tokio::test]
    async fn test_loop_results_render_per_item() {
        let (callback, buffer) = test_callback(CounterEnabledOptions::default());
        callback.on_play_start(&play("deploy", &["web1"], 1)).await;

        let task = TaskInfo::new("install packages", "package").with_loop(true);
        callback.on_task_start(&task, false).await;

        let result = HostResult::new(
            "web1",
            task.clone(),
            ResultInfo::changed().with_items(vec![
                ItemResult::new(json!("nginx"), TaskStatus::Changed),
                ItemResult::new(json!("vim"), TaskStatus::Ok),
            ]),
        );
        callback.on_task_ok(&result).await;

        let output = buffer.contents();
        assert!(output.contains("changed: [web1] (item=nginx)"));
        assert!(output.contains("ok: [web1] (item=vim)"));
        // No single summary line for the loop task.
        assert!(!output.contains("changed: 1/1 [web1]"));
    }

    #[tokio::test]
    async fn test_free_strategy_reprints_missing_banner() {
        let (callback, buffer) = test_callback(CounterEnabledOptions::default());
        let free_play = play("deploy", &["web1", "web2"], 2).with_strategy("free");
        callback.on_play_start(&free_play).await;

        let task_a = TaskInfo::new("first", "debug");
        let task_b = TaskInfo::new("second", "debug");
        callback.on_task_start(&task_a, false).await;
        callback.on_task_ok(&ok_result("web1", &task_a)).await;

        // web1 races ahead to the second task before its start event.
        callback.on_task_ok(&ok_result("web1", &task_b)).await;

        let output = buffer.contents();
        assert!(output.contains("[second]"));
    }

    #[tokio::test]
    async fn test_linear_strategy_never_reprints_banner() {
        let (callback, buffer) = test_callback(CounterEnabledOptions::default());
        callback
            .on_play_start(&play("deploy", &["web1"], 2).with_strategy("linear"))
            .await;

        let task_a = TaskInfo::new("first", "debug");
        let task_b = TaskInfo::new("second", "debug");
        callback.on_task_start(&task_a, false).await;
        callback.on_task_ok(&ok_result("web1", &task_b)).await;

        assert!(!buffer.contents().contains("[second]"));
    }

    #[tokio::test]
    async fn test_verbose_appends_result_dump() {
        let buffer = CaptureBuffer::default();
        let display = Display::with_writer(Box::new(buffer.clone())).with_verbosity(1);
        let callback = CounterEnabledCallback::builder().display(display).build();

        callback.on_play_start(&play("deploy", &["web1"], 1)).await;
        let task = TaskInfo::new("probe", "command");
        callback.on_task_start(&task, false).await;

        let mut data = IndexMap::new();
        data.insert("rc".to_string(), json!(0));
        let result = HostResult::new("web1", task, ResultInfo::ok().with_data(data));
        callback.on_task_ok(&result).await;

        assert!(buffer.contents().contains("ok: 1/1 [web1] => {"));
    }

    #[tokio::test]
    async fn test_no_log_suppresses_verbose_dump_and_args() {
        let buffer = CaptureBuffer::default();
        let display = Display::with_writer(Box::new(buffer.clone())).with_verbosity(1);
        let callback = CounterEnabledCallback::builder()
            .display_args_to_stdout(true)
            .display(display)
            .build();

        callback.on_play_start(&play("deploy", &["web1"], 1)).await;

        let mut args = IndexMap::new();
        args.insert("password".to_string(), json!("hunter2"));
        let task = TaskInfo::new("set secret", "user")
            .with_args(args)
            .with_no_log(true);
        callback.on_task_start(&task, false).await;
        callback.on_task_ok(&ok_result("web1", &task)).await;

        let output = buffer.contents();
        assert!(!output.contains("hunter2"));
        assert!(output.contains("ok: 1/1 [web1]"));
    }

    #[tokio::test]
    async fn test_args_in_banner_when_opted_in() {
        let (callback, buffer) = {
            let buffer = CaptureBuffer::default();
            let display = Display::with_writer(Box::new(buffer.clone()));
            let callback = CounterEnabledCallback::builder()
                .display_args_to_stdout(true)
                .display(display)
                .build();
            (callback, buffer)
        };

        callback.on_play_start(&play("deploy", &["web1"], 1)).await;
        let mut args = IndexMap::new();
        args.insert("name".to_string(), json!("nginx"));
        args.insert("state".to_string(), json!("present"));
        let task = TaskInfo::new("install", "package").with_args(args);
        callback.on_task_start(&task, false).await;

        assert!(buffer
            .contents()
            .contains(r#"TASK 1/1 [install name="nginx", state="present"]"#));
    }

    #[tokio::test]
    async fn test_task_path_printed_at_vv() {
        let buffer = CaptureBuffer::default();
        let display = Display::with_writer(Box::new(buffer.clone())).with_verbosity(2);
        let callback = CounterEnabledCallback::builder().display(display).build();

        callback.on_play_start(&play("deploy", &["web1"], 1)).await;
        let task = TaskInfo::new("install", "package").with_path("roles/web/tasks/main.yml:12");
        callback.on_task_start(&task, false).await;

        assert!(buffer
            .contents()
            .contains("task path: roles/web/tasks/main.yml:12"));
    }

    #[tokio::test]
    async fn test_warnings_surfaced_from_result() {
        let (callback, buffer) = test_callback(CounterEnabledOptions::default());
        callback.on_play_start(&play("deploy", &["web1"], 1)).await;

        let task = TaskInfo::new("run", "command");
        callback.on_task_start(&task, false).await;
        let result = HostResult::new(
            "web1",
            task,
            ResultInfo::ok().with_warning("Consider using the file module"),
        );
        callback.on_task_ok(&result).await;

        assert!(buffer
            .contents()
            .contains("[WARNING]: Consider using the file module"));
    }

    #[tokio::test]
    async fn test_exception_truncated_below_vvv() {
        let (callback, buffer) = test_callback(CounterEnabledOptions::default());
        callback.on_play_start(&play("deploy", &["web1"], 1)).await;

        let task = TaskInfo::new("crash", "command");
        callback.on_task_start(&task, false).await;
        let result = HostResult::new(
            "web1",
            task,
            ResultInfo::failed("boom").with_exception("Traceback:\n  frame\nValueError: bad input"),
        );
        callback.on_task_failed(&result, false).await;

        let output = buffer.contents();
        assert!(output.contains("use -vvv. The error was: ValueError: bad input"));
        assert!(!output.contains("  frame"));
    }

    #[tokio::test]
    async fn test_recap_sorted_by_hostname() {
        let (callback, buffer) = test_callback(CounterEnabledOptions::default());

        let mut stats = RunStats::new();
        stats.increment(crate::stats::StatField::Ok, "web2");
        stats.increment(crate::stats::StatField::Changed, "db1");
        stats.increment(crate::stats::StatField::Failures, "web1");
        callback.on_stats(&stats).await;

        let output = buffer.contents();
        assert!(output.contains("PLAY RECAP"));
        let db1 = output.find("db1").unwrap();
        let web1 = output.find("web1").unwrap();
        let web2 = output.find("web2").unwrap();
        assert!(db1 < web1 && web1 < web2);
        assert!(output.contains("ok=0 changed=1 unreachable=0 failed=0 rescued=0 ignored=0"));
    }

    #[tokio::test]
    async fn test_recap_custom_stats_hidden_by_default() {
        let (callback, buffer) = test_callback(CounterEnabledOptions::default());

        let mut stats = RunStats::new();
        stats.increment(crate::stats::StatField::Ok, "web1");
        stats.set_custom("web1", json!({"deployed": 3}));
        callback.on_stats(&stats).await;

        assert!(!buffer.contents().contains("CUSTOM STATS"));
    }

    #[tokio::test]
    async fn test_recap_custom_stats_when_enabled() {
        let options = CounterEnabledOptions::default().with_show_custom_stats(true);
        let (callback, buffer) = test_callback(options);

        let mut stats = RunStats::new();
        stats.increment(crate::stats::StatField::Ok, "web1");
        stats.set_custom("web1", json!({"deployed": 3}));
        stats.set_custom(RUN_BUCKET, json!({"total": 3}));
        callback.on_stats(&stats).await;

        let output = buffer.contents();
        assert!(output.contains("CUSTOM STATS:"));
        assert!(output.contains("\tweb1: {\"deployed\":3}"));
        assert!(output.contains("\tRUN: {\"total\":3}"));
        // The aggregate bucket never appears as a host entry.
        assert!(!output.contains("\t_run:"));
    }
}
