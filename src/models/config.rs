use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Harness settings from Harness Settings.yaml
///
/// All timeouts that bound the harness's blocking operations, plus the
/// poll cadence and the output naming convention of the application under
/// test. Every field has a default so a missing or partial file works.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarnessSettings {
    #[serde(rename = "Harness", default)]
    pub harness: HarnessTimeouts,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarnessTimeouts {
    /// Bound on waiting for the worker's readiness latch during start.
    #[serde(rename = "Startup Timeout", default = "default_startup_timeout")]
    pub startup_timeout_secs: u64,

    /// Cadence at which condition probes are re-invoked.
    #[serde(rename = "Poll Interval", default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Bound on waiting for the signed output file to appear.
    #[serde(rename = "Output Timeout", default = "default_output_timeout")]
    pub output_timeout_secs: u64,

    /// Time given to the worker to terminate after a graceful exit request.
    #[serde(rename = "Grace Period", default = "default_grace_period")]
    pub grace_period_secs: u64,

    /// Additional time given after the wake nudge before abandonment.
    #[serde(rename = "Force Period", default = "default_force_period")]
    pub force_period_secs: u64,

    /// Suffix inserted before the extension of signed output files.
    #[serde(rename = "Output Postfix", default = "default_output_postfix")]
    pub output_postfix: String,
}

impl HarnessSettings {
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.harness.startup_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.harness.poll_interval_ms)
    }

    pub fn output_timeout(&self) -> Duration {
        Duration::from_secs(self.harness.output_timeout_secs)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.harness.grace_period_secs)
    }

    pub fn force_period(&self) -> Duration {
        Duration::from_secs(self.harness.force_period_secs)
    }
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            harness: HarnessTimeouts::default(),
        }
    }
}

impl Default for HarnessTimeouts {
    fn default() -> Self {
        Self {
            startup_timeout_secs: default_startup_timeout(),
            poll_interval_ms: default_poll_interval(),
            output_timeout_secs: default_output_timeout(),
            grace_period_secs: default_grace_period(),
            force_period_secs: default_force_period(),
            output_postfix: default_output_postfix(),
        }
    }
}

fn default_startup_timeout() -> u64 {
    30
}

fn default_poll_interval() -> u64 {
    200
}

fn default_output_timeout() -> u64 {
    20
}

fn default_grace_period() -> u64 {
    10
}

fn default_force_period() -> u64 {
    3
}

fn default_output_postfix() -> String {
    "_superSigned".to_string()
}
