//! Engine configuration.
//!
//! Everything has a default, so an empty JSON object is a valid config:
//!
//! ```rust
//! use behavior_plan::config::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "tick_interval_ms": 50 }"#).unwrap();
//! assert_eq!(config.tick_interval().as_millis(), 50);
//! assert_eq!(config.poll_interval().as_millis(), 100);
//! ```

use crate::{PlanError, PlanResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Settings shared by plans, executors and the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pause between scheduler rounds, in milliseconds
    pub tick_interval_ms: u64,
    /// Pause between executor queue polls, in milliseconds
    pub poll_interval_ms: u64,
    /// Give up after this many scheduler rounds; `None` runs until done
    pub max_rounds: Option<usize>,
    /// Default verbosity for nodes built through a plan context
    pub verbose: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            poll_interval_ms: 100,
            max_rounds: None,
            verbose: true,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> PlanResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file
    pub fn from_path(path: impl AsRef<Path>) -> PlanResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Set the tick interval
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval_ms = whole_millis(interval);
        self
    }

    /// Set the executor poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = whole_millis(interval);
        self
    }

    /// Set the round limit
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = Some(max_rounds);
        self
    }

    /// Set default node verbosity
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Reject settings that would turn a loop into a busy spin or never run it.
    pub fn validate(&self) -> PlanResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(PlanError::ConfigError(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_rounds == Some(0) {
            return Err(PlanError::ConfigError(
                "max_rounds must be greater than zero when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Scheduler settings derived from this config
    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig {
            tick_interval: self.tick_interval(),
            max_rounds: self.max_rounds,
        }
    }
}

/// Milliseconds, rounded up so a non-zero interval never becomes zero
fn whole_millis(interval: Duration) -> u64 {
    u64::try_from(interval.as_nanos().div_ceil(1_000_000)).unwrap_or(u64::MAX)
}

/// Settings for one scheduler run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Pause after every round
    pub tick_interval: Duration,
    /// Optional round limit
    pub max_rounds: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        EngineConfig::default().scheduler()
    }
}

impl SchedulerConfig {
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            tick_interval,
            max_rounds: None,
        }
    }

    /// Set the round limit
    pub fn max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = Some(max_rounds);
        self
    }
}
