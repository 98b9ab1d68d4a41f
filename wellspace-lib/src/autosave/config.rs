//! Auto-save configuration and status types

use std::fmt;
use std::time::Duration;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Timing of the auto-save state machine.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use wellspace_lib::autosave::AutoSaveConfig;
///
/// let config = AutoSaveConfig::default().delay(Duration::from_secs(2));
/// assert_eq!(config.saved_cooldown, Duration::from_secs(3));
/// ```
#[derive(Debug, Clone)]
pub struct AutoSaveConfig {
    /// Quiet period after the last edit before saving.
    pub delay: Duration,
    /// How long `Saved` is shown before returning to `Idle`.
    pub saved_cooldown: Duration,
    /// How long `Error` is shown before returning to `Idle`.
    pub error_cooldown: Duration,
    /// When false, `save` does nothing. Manual saves still run.
    pub enabled: bool,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(5),
            saved_cooldown: Duration::from_secs(3),
            error_cooldown: Duration::from_secs(5),
            enabled: true,
        }
    }
}

impl AutoSaveConfig {
    /// Sets the debounce delay.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the `Saved` cool-down.
    pub fn saved_cooldown(mut self, after: Duration) -> Self {
        self.saved_cooldown = after;
        self
    }

    /// Sets the `Error` cool-down.
    pub fn error_cooldown(mut self, after: Duration) -> Self {
        self.error_cooldown = after;
        self
    }

    /// Enables or disables debounced saving.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Where the auto-save state machine is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoSaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error,
}

impl fmt::Display for AutoSaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Saving => "saving",
            Self::Saved => "saved",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// What became of one persistence request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Persisted.
    Saved {
        /// When the save completed.
        at: DateTime<Utc>,
    },
    /// A newer payload replaced this one while it waited for the slot.
    Superseded,
    /// The coordinator was torn down first.
    Cancelled,
}
