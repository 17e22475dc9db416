//! Timeout / privilege policy resolution.
//!
//! Callers describe a command's policy with [`ExecOptions`] (every field optional);
//! [`ExecPolicy::resolve`] turns that into the concrete values the executor uses.

use once_cell::sync::OnceCell;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

/// Timeout applied when a caller does not supply one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

static DEFAULT_TIMEOUT: OnceCell<u64> = OnceCell::new();

/// Override the process-wide default timeout. Only the first call wins.
pub fn init_default_timeout(secs: u64) -> bool {
    DEFAULT_TIMEOUT.set(secs).is_ok()
}

/// Process-wide default timeout in seconds.
pub fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT
        .get()
        .copied()
        .unwrap_or(DEFAULT_TIMEOUT_SECS)
}

/// Per-call options. Unknown keys are ignored when deserialising.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExecOptions {
    /// Deadline in seconds.
    pub timeout: Option<u64>,
    pub log_output_on_error: Option<bool>,
    pub run_as_root: Option<bool>,
}

impl ExecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options used by every volume tool invocation: escalate and log failures.
    pub fn privileged() -> Self {
        Self {
            timeout: None,
            log_output_on_error: Some(true),
            run_as_root: Some(true),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Some(secs);
        self
    }

    pub fn with_run_as_root(mut self, run_as_root: bool) -> Self {
        self.run_as_root = Some(run_as_root);
        self
    }

    pub fn with_log_output_on_error(mut self, log: bool) -> Self {
        self.log_output_on_error = Some(log);
        self
    }

    /// Read options out of a loosely typed key/value bag.
    ///
    /// A recognised key holding a value of the wrong type is treated as absent.
    pub fn from_bag(bag: &Map<String, Value>) -> Self {
        Self {
            timeout: bag.get("timeout").and_then(timeout_secs),
            log_output_on_error: bag.get("log_output_on_error").and_then(Value::as_bool),
            run_as_root: bag.get("run_as_root").and_then(Value::as_bool),
        }
    }
}

// Integer timeouts pass through unvalidated; negative ones clamp to an immediate deadline.
fn timeout_secs(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_i64().map(|secs| secs.max(0) as u64))
}

/// Fully resolved execution policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecPolicy {
    pub timeout: Duration,
    pub run_as_root: bool,
    pub log_output_on_error: bool,
}

impl ExecPolicy {
    // Zero timeouts are passed through unchanged; such a command times out immediately.
    pub fn resolve(opts: &ExecOptions) -> Self {
        Self {
            timeout: Duration::from_secs(opts.timeout.unwrap_or_else(default_timeout_secs)),
            run_as_root: opts.run_as_root.unwrap_or(false),
            log_output_on_error: opts.log_output_on_error.unwrap_or(false),
        }
    }
}

impl Default for ExecPolicy {
    fn default() -> Self {
        Self::resolve(&ExecOptions::default())
    }
}
