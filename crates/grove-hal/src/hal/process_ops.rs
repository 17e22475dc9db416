//! Process execution seam.
//!
//! External commands are "world-touching" and must go through the HAL so the
//! volume layer can be tested without spawning privileged tools.

use crate::policy::{ExecOptions, ExecPolicy};
use grove_error::{ExecError, ExecResult};
use std::time::Duration;

/// One external command, built fresh for every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    argv: Vec<String>,
    timeout: Duration,
    run_as_root: bool,
    log_output_on_error: bool,
}

impl CommandInvocation {
    pub fn new<S: AsRef<str>>(argv: &[S], policy: ExecPolicy) -> Self {
        Self {
            argv: argv.iter().map(|s| s.as_ref().to_string()).collect(),
            timeout: policy.timeout,
            run_as_root: policy.run_as_root,
            log_output_on_error: policy.log_output_on_error,
        }
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn run_as_root(&self) -> bool {
        self.run_as_root
    }

    pub fn log_output_on_error(&self) -> bool {
        self.log_output_on_error
    }

    /// Space-joined command line, used in logs and error messages.
    pub fn command_line(&self) -> String {
        self.argv.join(" ")
    }

    /// The argv actually handed to the OS, with the escalation wrapper prepended when needed.
    pub fn effective_argv(&self, root_helper: &str) -> ExecResult<Vec<String>> {
        if self.argv.is_empty() {
            return Err(ExecError::EmptyCommand);
        }
        let mut argv = Vec::with_capacity(self.argv.len() + 1);
        if self.run_as_root && !root_helper.is_empty() {
            argv.push(root_helper.to_string());
        }
        argv.extend(self.argv.iter().cloned());
        Ok(argv)
    }
}

/// Bounded command executor.
pub trait ProcessOps: Send + Sync {
    /// Run the command and return its combined stdout/stderr.
    ///
    /// Never terminates the process: timeouts, non-zero exits and launch
    /// failures all come back as [`ExecError`].
    fn execute(&self, invocation: &CommandInvocation) -> ExecResult<String>;

    /// Resolve `opts` into a policy and run `argv` under it.
    fn execute_with_options(&self, argv: &[&str], opts: &ExecOptions) -> ExecResult<String> {
        let invocation = CommandInvocation::new(argv, ExecPolicy::resolve(opts));
        self.execute(&invocation)
    }
}

/// Run `cmd args...` and return its output; failures yield an empty string.
pub fn execute_shell_cmd(
    hal: &dyn ProcessOps,
    cmd: &str,
    args: &[&str],
    opts: &ExecOptions,
) -> String {
    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push(cmd);
    argv.extend_from_slice(args);
    match hal.execute_with_options(&argv, opts) {
        Ok(stdout) => stdout,
        Err(err) => {
            log::debug!("shell command '{}' produced no output: {}", argv.join(" "), err);
            String::new()
        }
    }
}

/// Shared failure logging for executors.
pub(crate) fn report_failure(invocation: &CommandInvocation, err: &ExecError) {
    if let ExecError::Timeout { timeout_secs, .. } = err {
        log::warn!(
            "Timeout after {} seconds running: {:?} (run_as_root={}).",
            timeout_secs,
            invocation.argv(),
            invocation.run_as_root()
        );
        return;
    }
    if invocation.log_output_on_error() {
        log::error!("{}", err);
    }
}
