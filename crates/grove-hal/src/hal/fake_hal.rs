//! Fake HAL implementation for testing.
//!
//! Records every invocation without spawning anything and replays scripted
//! outcomes, allowing CI-safe tests of multi-step volume operations without
//! root privileges or real block devices.

use super::process_ops::{report_failure, CommandInvocation, ProcessOps};
use grove_error::{ExecError, ExecResult};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

/// Operation records for testing and verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Command {
        argv: Vec<String>,
        timeout_secs: u64,
        run_as_root: bool,
        log_output_on_error: bool,
    },
}

impl Operation {
    pub fn argv(&self) -> &[String] {
        match self {
            Operation::Command { argv, .. } => argv,
        }
    }
}

/// Scripted result for the next recorded command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeOutcome {
    Success(String),
    NonZeroExit { exit_code: i32, output: String },
    Timeout,
    LaunchFailure,
}

impl FakeOutcome {
    pub fn success(output: impl Into<String>) -> Self {
        FakeOutcome::Success(output.into())
    }

    pub fn non_zero_exit(exit_code: i32, output: impl Into<String>) -> Self {
        FakeOutcome::NonZeroExit {
            exit_code,
            output: output.into(),
        }
    }

    fn into_result(self, invocation: &CommandInvocation) -> ExecResult<String> {
        let cmd = invocation.command_line();
        match self {
            FakeOutcome::Success(output) => Ok(output),
            FakeOutcome::NonZeroExit { exit_code, output } => Err(ExecError::NonZeroExit {
                cmd,
                exit_code,
                stdout: String::new(),
                stderr: output,
                description: "Execute command failed".to_string(),
            }),
            FakeOutcome::Timeout => Err(ExecError::Timeout {
                cmd,
                timeout_secs: invocation.timeout().as_secs(),
            }),
            FakeOutcome::LaunchFailure => Err(ExecError::LaunchFailure {
                cmd,
                source: io::Error::new(io::ErrorKind::NotFound, "fake: no such file"),
            }),
        }
    }
}

#[derive(Debug, Default)]
struct FakeHalState {
    operations: Vec<Operation>,
    outcomes: VecDeque<FakeOutcome>,
}

/// Fake HAL implementation that records operations without executing them.
///
/// Commands consume scripted outcomes in FIFO order; once the script runs out
/// every command succeeds with empty output.
#[derive(Debug, Clone, Default)]
pub struct FakeHal {
    state: Arc<Mutex<FakeHalState>>,
}

impl FakeHal {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeHalState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue the outcome for the next unscripted command.
    pub fn push_outcome(&self, outcome: FakeOutcome) {
        self.state().outcomes.push_back(outcome);
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<Operation> {
        self.state().operations.clone()
    }

    /// Argument vectors of all recorded commands, in order.
    pub fn commands(&self) -> Vec<Vec<String>> {
        self.state()
            .operations
            .iter()
            .map(|op| op.argv().to_vec())
            .collect()
    }

    /// Get the number of operations recorded.
    pub fn operation_count(&self) -> usize {
        self.state().operations.len()
    }

    /// Check if a specific operation was recorded.
    pub fn has_operation(&self, check: impl Fn(&Operation) -> bool) -> bool {
        self.state().operations.iter().any(check)
    }

    /// Clear recorded operations and any unconsumed outcomes.
    pub fn clear(&self) {
        let mut state = self.state();
        state.operations.clear();
        state.outcomes.clear();
    }
}

impl ProcessOps for FakeHal {
    fn execute(&self, invocation: &CommandInvocation) -> ExecResult<String> {
        if invocation.argv().is_empty() {
            return Err(ExecError::EmptyCommand);
        }
        log::info!("FAKE HAL: {}", invocation.command_line());

        let outcome = {
            let mut state = self.state();
            state.operations.push(Operation::Command {
                argv: invocation.argv().to_vec(),
                timeout_secs: invocation.timeout().as_secs(),
                run_as_root: invocation.run_as_root(),
                log_output_on_error: invocation.log_output_on_error(),
            });
            state.outcomes.pop_front()
        };

        let result = outcome
            .unwrap_or_else(|| FakeOutcome::success(""))
            .into_result(invocation);
        if let Err(err) = &result {
            report_failure(invocation, err);
        }
        result
    }
}
