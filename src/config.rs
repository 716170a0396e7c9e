//! Store configuration.

use crate::error::{Error, Result};
use std::path::Path;
use std::time::Duration;

/// File used by [`Store::open_default`](crate::Store::open_default).
pub const DEFAULT_PATH: &str = "./db.json";

/// Time between autosave attempts.
pub const DEFAULT_SAVE_INTERVAL: Duration = Duration::from_millis(5000);

/// Pause after a successful load before the store reports ready.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1000);

/// Pause between an autosave tick firing and the save starting.
pub const DEFAULT_SAVE_DEBOUNCE: Duration = Duration::from_millis(100);

/// Options for opening a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// How often the background worker tries to save. Must be non-zero.
    pub save_interval: Duration,

    /// Keep everything in memory: no recovery, no load, no saves.
    pub in_memory: bool,

    /// Quiet period after loading before the store is marked ready.
    pub settle_delay: Duration,

    /// Delay inside an autosave tick, letting bursts of mutation settle.
    pub save_debounce: Duration,

    /// Indent the JSON file (four spaces) instead of writing one line.
    pub pretty: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            save_interval: DEFAULT_SAVE_INTERVAL,
            in_memory: false,
            settle_delay: DEFAULT_SETTLE_DELAY,
            save_debounce: DEFAULT_SAVE_DEBOUNCE,
            pretty: true,
        }
    }
}

impl StoreOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the autosave interval.
    #[must_use]
    pub const fn save_interval(mut self, interval: Duration) -> Self {
        self.save_interval = interval;
        self
    }

    /// Sets in-memory mode.
    #[must_use]
    pub const fn in_memory(mut self, value: bool) -> Self {
        self.in_memory = value;
        self
    }

    /// Sets the post-load settle delay.
    #[must_use]
    pub const fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Sets the autosave debounce.
    #[must_use]
    pub const fn save_debounce(mut self, delay: Duration) -> Self {
        self.save_debounce = delay;
        self
    }

    /// Sets pretty-printing.
    #[must_use]
    pub const fn pretty(mut self, value: bool) -> Self {
        self.pretty = value;
        self
    }

    /// Check the options against the path they'll be used with.
    pub fn validate(&self, path: &Path) -> Result<()> {
        if self.save_interval.is_zero() {
            return Err(Error::Config("save interval must be greater than zero".into()));
        }
        if !self.in_memory && path.as_os_str().is_empty() {
            return Err(Error::Config("path must not be empty".into()));
        }
        Ok(())
    }
}
