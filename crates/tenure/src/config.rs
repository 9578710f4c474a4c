//! Manager configuration.

use std::time::Duration;

use tenure_core::DEFAULT_REMINDER_WINDOW;

/// Timing knobs for the manager and its scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Lead time before expiry at which the one-time reminder is sent.
    pub reminder_window: Duration,
    /// Time between sweeps.
    pub sweep_interval: Duration,
    /// Delay before the first sweep after startup.
    pub startup_delay: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            reminder_window: DEFAULT_REMINDER_WINDOW,
            sweep_interval: Duration::from_secs(60 * 60),
            startup_delay: Duration::from_secs(10),
        }
    }
}

impl ManagerConfig {
    pub fn with_reminder_window(mut self, window: Duration) -> Self {
        self.reminder_window = window;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub fn with_startup_delay(mut self, delay: Duration) -> Self {
        self.startup_delay = delay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ManagerConfig::default();
        assert_eq!(config.reminder_window, Duration::from_secs(86_400));
        assert_eq!(config.sweep_interval, Duration::from_secs(3_600));
        assert_eq!(config.startup_delay, Duration::from_secs(10));
    }
}
