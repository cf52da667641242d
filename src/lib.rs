//! Counter-enabled stdout callback for playbook runs.
//!
//! This crate provides a stdout callback plugin that decorates the standard
//! run narration with progress counters: task banners show `TASK n/total`
//! and per-host result lines show `host n/total`, so long runs against big
//! inventories read like a progress bar.
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
//! # Usage
//!
//! ```rust,no_run
//! use counter_enabled::{CounterEnabledCallback, CounterEnabledOptions};
//!
//! let options = CounterEnabledOptions::from_env()?;
//! let callback = CounterEnabledCallback::with_options(options);
//! // Hand `callback` to the execution host as its stdout plugin.
//! # Ok::<(), counter_enabled::Error>(())
//! ```
//!
//! # Modules
//!
//! - [`plugin`]: the [`CallbackPlugin`] hook contract
//! - [`counter_enabled`]: the counter-enabled callback itself
//! - [`event`]: playbook, play, task, and result snapshots delivered with events
//! - [`stats`]: aggregate run statistics for the recap
//! - [`display`]: the screen/log display service
//! - [`config`]: plugin options and environment overrides

pub mod config;
pub mod counter_enabled;
pub mod display;
pub mod error;
pub mod event;
pub mod plugin;
pub mod stats;

pub use config::CounterEnabledOptions;
pub use counter_enabled::{CounterEnabledCallback, CounterEnabledCallbackBuilder};
pub use display::{Display, DisplayOptions};
pub use error::{Error, Result};
pub use event::{
    HostResult, ItemResult, PlayInfo, PlaybookInfo, ResultInfo, TaskInfo, TaskStatus,
};
pub use plugin::{CallbackPlugin, CallbackType, CALLBACK_API_VERSION};
pub use stats::{HostSummary, RunStats, StatField, RUN_BUCKET};
