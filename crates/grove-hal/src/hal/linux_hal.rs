//! Linux HAL implementation spawning real processes.

use super::process_ops::{report_failure, CommandInvocation, ProcessOps};
use grove_error::{ExecError, ExecResult};
use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use wait_timeout::ChildExt;

/// Escalation wrapper used when none is configured.
pub const DEFAULT_ROOT_HELPER: &str = "sudo";

const FAILURE_DESCRIPTION: &str = "Execute command failed";

/// Real HAL implementation for Linux hosts.
#[derive(Debug, Clone)]
pub struct LinuxHal {
    root_helper: String,
}

impl Default for LinuxHal {
    fn default() -> Self {
        Self::new()
    }
}

impl LinuxHal {
    pub fn new() -> Self {
        Self::with_root_helper(DEFAULT_ROOT_HELPER)
    }

    /// Use `root_helper` as the escalation wrapper. An empty string disables the prefix.
    pub fn with_root_helper(root_helper: impl Into<String>) -> Self {
        Self {
            root_helper: root_helper.into(),
        }
    }

    pub fn root_helper(&self) -> &str {
        &self.root_helper
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> mpsc::Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        let _ = tx.send(buf);
    });
    rx
}

/// Wait for a drained pipe until `deadline`; `None` means the pipe is still held open.
fn collect(rx: &mpsc::Receiver<Vec<u8>>, deadline: Instant) -> Option<Vec<u8>> {
    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(buf) => Some(buf),
        Err(mpsc::RecvTimeoutError::Timeout) => None,
        Err(mpsc::RecvTimeoutError::Disconnected) => Some(Vec::new()),
    }
}

/// Kill and reap `child` unless `waited` carries its exit status.
fn settle(child: &mut Child, waited: io::Result<Option<ExitStatus>>) -> io::Result<Option<ExitStatus>> {
    if let Ok(Some(status)) = waited {
        return Ok(Some(status));
    }
    let _ = child.kill();
    let _ = child.wait();
    waited
}

fn output_with_timeout(cmd_line: &str, cmd: &mut Command, timeout: Duration) -> ExecResult<Output> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let deadline = Instant::now() + timeout;
    let mut child = cmd.spawn().map_err(|source| ExecError::LaunchFailure {
        cmd: cmd_line.to_string(),
        source,
    })?;

    // Drain pipes concurrently to avoid deadlocks on large output. Readers that
    // outlive the deadline are left detached.
    let stdout_rx = drain(child.stdout.take());
    let stderr_rx = drain(child.stderr.take());
    let timed_out = || ExecError::Timeout {
        cmd: cmd_line.to_string(),
        timeout_secs: timeout.as_secs(),
    };

    let waited = child.wait_timeout(timeout);
    let status = match settle(&mut child, waited) {
        Ok(Some(status)) => status,
        Ok(None) => return Err(timed_out()),
        Err(err) => return Err(ExecError::Io(err)),
    };

    // Grandchildren may keep the pipes open after the direct child exits.
    let stdout = collect(&stdout_rx, deadline).ok_or_else(&timed_out)?;
    let stderr = collect(&stderr_rx, deadline).ok_or_else(&timed_out)?;
    Ok(Output {
        status,
        stdout,
        stderr,
    })
}

impl ProcessOps for LinuxHal {
    fn execute(&self, invocation: &CommandInvocation) -> ExecResult<String> {
        let argv = invocation.effective_argv(&self.root_helper)?;
        let cmd_line = argv.join(" ");
        log::debug!(
            "Executing '{}' (timeout {}s)",
            cmd_line,
            invocation.timeout().as_secs()
        );

        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..]);

        let result = output_with_timeout(&cmd_line, &mut cmd, invocation.timeout()).and_then(
            |output| {
                let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
                let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
                if output.status.success() {
                    return Ok(format!("{stdout}{stderr}"));
                }
                Err(ExecError::NonZeroExit {
                    cmd: cmd_line.clone(),
                    exit_code: output.status.code().unwrap_or(-1),
                    stdout,
                    stderr,
                    description: FAILURE_DESCRIPTION.to_string(),
                })
            },
        );

        if let Err(err) = &result {
            report_failure(invocation, err);
        }
        result
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::policy::{ExecOptions, ExecPolicy};

    fn run(hal: &LinuxHal, argv: &[&str], opts: ExecOptions) -> ExecResult<String> {
        hal.execute(&CommandInvocation::new(argv, ExecPolicy::resolve(&opts)))
    }

    #[test]
    fn success_returns_combined_output() {
        let hal = LinuxHal::new();
        let out = run(
            &hal,
            &["sh", "-c", "printf out; printf err >&2"],
            ExecOptions::new().with_timeout(10),
        )
        .unwrap();
        assert_eq!(out, "outerr");
    }

    #[test]
    fn non_zero_exit_carries_code_and_output() {
        let hal = LinuxHal::new();
        let err = run(
            &hal,
            &["sh", "-c", "echo broken >&2; exit 7"],
            ExecOptions::new().with_timeout(10).with_log_output_on_error(true),
        )
        .unwrap_err();
        match &err {
            ExecError::NonZeroExit {
                cmd,
                exit_code,
                stdout,
                stderr,
                description,
            } => {
                assert_eq!(cmd, "sh -c echo broken >&2; exit 7");
                assert_eq!(*exit_code, 7);
                assert!(stdout.is_empty());
                assert_eq!(stderr, "broken\n");
                assert_eq!(description, FAILURE_DESCRIPTION);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.combined_output(), "broken\n");
    }

    #[test]
    fn missing_binary_is_launch_failure() {
        let hal = LinuxHal::new();
        let err = run(
            &hal,
            &["grove-definitely-not-a-real-binary"],
            ExecOptions::new().with_timeout(5),
        )
        .unwrap_err();
        assert!(matches!(err, ExecError::LaunchFailure { .. }));
    }

    #[test]
    fn deadline_is_enforced() {
        let hal = LinuxHal::new();
        let start = Instant::now();
        let err = run(&hal, &["sleep", "10"], ExecOptions::new().with_timeout(1)).unwrap_err();
        assert!(err.is_timeout(), "unexpected error: {err:?}");
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn background_grandchild_cannot_outlive_deadline() {
        let hal = LinuxHal::new();
        let start = Instant::now();
        let err = run(
            &hal,
            &["sh", "-c", "sleep 8 & echo started"],
            ExecOptions::new().with_timeout(1),
        )
        .unwrap_err();
        assert!(err.is_timeout(), "unexpected error: {err:?}");
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn failed_wait_still_reaps_child() {
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        let waited = Err(io::Error::new(io::ErrorKind::Other, "wait failed"));
        let err = settle(&mut child, waited).unwrap_err();
        assert_eq!(err.to_string(), "wait failed");
        assert!(child.try_wait().unwrap().is_some());
    }

    #[test]
    fn root_helper_prefixes_privileged_commands() {
        // `env` stands in for the escalation wrapper: it just execs its arguments.
        let hal = LinuxHal::with_root_helper("env");
        let out = run(
            &hal,
            &["echo", "escalated"],
            ExecOptions::new().with_timeout(10).with_run_as_root(true),
        )
        .unwrap();
        assert_eq!(out.trim(), "escalated");

        let err = run(
            &hal,
            &["false"],
            ExecOptions::new().with_timeout(10).with_run_as_root(true),
        )
        .unwrap_err();
        match err {
            ExecError::NonZeroExit { cmd, .. } => assert_eq!(cmd, "env false"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_argv_is_rejected() {
        let hal = LinuxHal::new();
        let err = run(&hal, &[], ExecOptions::new()).unwrap_err();
        assert!(matches!(err, ExecError::EmptyCommand));
    }
}
