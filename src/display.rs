//! Display service for screen and log output channels.
//!
//! The host routes all callback output through a display service with two
//! channels: the screen (colorized, interactive) and the run log (plain
//! text, persisted). This module models that service for the plugin:
//! screen output goes to a caller-supplied [`Write`] sink (stdout by
//! default) and log output goes through `tracing`, so whatever subscriber
//! the host installs receives the uncolored rendition.
//!
//! Color handling follows the usual terminal conventions: colors are only
//! applied when the sink is a terminal and `NO_COLOR` is unset, and can be
//! forced off explicitly.

use std::fmt;
use std::io::{self, Write};

use colored::{Color, Colorize};
use is_terminal::IsTerminal;
use parking_lot::Mutex;

/// The standard width for banner formatting.
const OUTPUT_WIDTH: usize = 80;

/// Width hosts are padded to in recap lines.
const RECAP_HOST_WIDTH: usize = 26;

// ============================================================================
// Display Options
// ============================================================================

/// Routing and color options for a single display call.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayOptions {
    /// Color to apply on the screen channel
    pub color: Option<Color>,
    /// Only write to the screen, not the run log
    pub screen_only: bool,
    /// Only write to the run log, not the screen
    pub log_only: bool,
}

impl DisplayOptions {
    /// Options applying a screen color.
    pub fn color(color: Color) -> Self {
        Self {
            color: Some(color),
            ..Self::default()
        }
    }

    /// Screen-only routing, with an optional color.
    pub fn screen_only(color: Option<Color>) -> Self {
        Self {
            color,
            screen_only: true,
            log_only: false,
        }
    }

    /// Log-only routing (always uncolored).
    pub fn log_only() -> Self {
        Self {
            color: None,
            screen_only: false,
            log_only: true,
        }
    }
}

// ============================================================================
// Display Service
// ============================================================================

/// Screen/log display service consumed by stdout callbacks.
pub struct Display {
    verbosity: u8,
    use_color: bool,
    screen: Mutex<Box<dyn Write + Send>>,
}

impl fmt::Debug for Display {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Display")
            .field("verbosity", &self.verbosity)
            .field("use_color", &self.use_color)
            .finish_non_exhaustive()
    }
}

impl Display {
    /// Create a display writing to stdout, with color detection from the
    /// terminal and the `NO_COLOR` environment variable.
    pub fn new() -> Self {
        let use_color = io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err();
        Self {
            verbosity: 0,
            use_color,
            screen: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Create a display writing to a custom sink. Color is off until
    /// explicitly enabled, since an arbitrary sink is not a terminal.
    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            verbosity: 0,
            use_color: false,
            screen: Mutex::new(writer),
        }
    }

    /// Set the verbosity level (0-5, the host's -v flag count).
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Enable or disable color. Enabling still respects `NO_COLOR`.
    pub fn with_color(mut self, use_color: bool) -> Self {
        self.use_color = use_color && std::env::var("NO_COLOR").is_err();
        self
    }

    /// Current verbosity level.
    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    /// Whether the screen channel colorizes output.
    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Write a message to the screen and/or run log per `opts`.
    ///
    /// Screen writes are colorized when enabled; the run log always gets
    /// the plain text. Write errors on the screen sink are swallowed, the
    /// same way the host treats a broken pipe at the end of a run.
    pub fn display(&self, msg: &str, opts: DisplayOptions) {
        if !opts.log_only {
            let rendered = match opts.color {
                Some(color) if self.use_color => msg.color(color).to_string(),
                _ => msg.to_string(),
            };
            let mut screen = self.screen.lock();
            let _ = writeln!(screen, "{rendered}");
            let _ = screen.flush();
        }

        if !opts.screen_only && !msg.is_empty() {
            tracing::info!(target: "counter_enabled::runlog", "{}", msg);
        }
    }

    /// Write a banner: the message followed by `*` padding to the standard
    /// width, preceded by a blank line.
    pub fn banner(&self, msg: &str) {
        let stars = "*".repeat(OUTPUT_WIDTH.saturating_sub(msg.len() + 1));
        self.display(&format!("\n{msg} {stars}"), DisplayOptions::default());
    }

    /// Surface a warning captured in a result payload.
    pub fn warning(&self, msg: &str) {
        self.display(
            &format!("[WARNING]: {msg}"),
            DisplayOptions::color(Color::BrightMagenta),
        );
    }

    /// Surface an error (e.g. a captured module exception).
    pub fn error(&self, msg: &str) {
        self.display(&format!("ERROR! {msg}"), DisplayOptions::color(Color::Red));
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Colorization Helpers
// ============================================================================

/// Render one `label=count` recap cell.
///
/// The cell is colorized only when a color is given and the count is
/// non-zero, so zero counts stay visually quiet in the recap.
pub fn colorize(label: &str, count: u32, color: Option<Color>) -> String {
    let cell = format!("{label}={count}");
    match color {
        Some(color) if count != 0 => cell.color(color).to_string(),
        _ => cell,
    }
}

/// Render a host name for the recap, padded for column alignment and
/// colored by the host's overall outcome: red for failures, yellow for
/// changes, green otherwise.
pub fn hostcolor(host: &str, summary: &crate::stats::HostSummary, colorized: bool) -> String {
    let padded = format!("{:<width$}", host, width = RECAP_HOST_WIDTH);
    if !colorized {
        return padded;
    }
    let color = if summary.has_failures() {
        Color::Red
    } else if summary.has_changes() {
        Color::Yellow
    } else {
        Color::Green
    };
    padded.color(color).to_string()
}

// ============================================================================
// Tests
// ============================================================================
