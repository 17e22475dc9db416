use std::backtrace::Backtrace;
use std::fmt;
use std::io;
use thiserror::Error;

pub type ExecResult<T> = Result<T, ExecError>;
pub type VolumeResult<T> = Result<T, VolumeError>;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("no command specified")]
    EmptyCommand,

    #[error("command '{cmd}' timed out after {timeout_secs}s")]
    Timeout { cmd: String, timeout_secs: u64 },

    #[error("Command '{cmd}' failed. {description} Exit code: {exit_code}\nstderr: {stderr}\nstdout: {stdout}")]
    NonZeroExit {
        cmd: String,
        exit_code: i32,
        stdout: String,
        stderr: String,
        description: String,
    },

    #[error("command '{cmd}' could not be launched: {source}")]
    LaunchFailure {
        cmd: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ExecError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ExecError::Timeout { .. })
    }

    /// Exit code of the failed process, if it ran to completion.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ExecError::NonZeroExit { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }

    /// Captured stdout followed by stderr, or empty for failures without output.
    pub fn combined_output(&self) -> String {
        match self {
            ExecError::NonZeroExit { stdout, stderr, .. } => format!("{stdout}{stderr}"),
            _ => String::new(),
        }
    }
}

/// An unrecoverable condition. The agent logs it and exits; see `grove_core::fatal`.
pub struct FatalError {
    log_message: String,
    exc_message: String,
    backtrace: Backtrace,
}

impl FatalError {
    pub fn new(log_message: impl Into<String>, exc_message: impl Into<String>) -> Self {
        Self {
            log_message: log_message.into(),
            exc_message: exc_message.into(),
            backtrace: Backtrace::force_capture(),
        }
    }

    pub fn log_message(&self) -> &str {
        &self.log_message
    }

    pub fn exc_message(&self) -> &str {
        &self.exc_message
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

impl fmt::Debug for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FatalError")
            .field("log_message", &self.log_message)
            .field("exc_message", &self.exc_message)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.exc_message)
    }
}

impl std::error::Error for FatalError {}

/// Build a [`FatalError`] from a log template and an exception template that
/// share the same positional arguments.
///
/// ```
/// let err = grove_error::fatal_error!(
///     "Could not format device: {} ({}).",
///     "Could not format device: {} ({}).",
///     "/dev/sdb1",
///     "xfs"
/// );
/// assert_eq!(err.log_message(), "Could not format device: /dev/sdb1 (xfs).");
/// ```
#[macro_export]
macro_rules! fatal_error {
    ($log_fmt:literal, $exc_fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::FatalError::new(
            format!($log_fmt $(, $arg)*),
            format!($exc_fmt $(, $arg)*),
        )
    };
}

#[derive(Error, Debug)]
pub enum VolumeError {
    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("Volume '{device}' was not formatted.")]
    NotFormatted { device: String },

    #[error("An error occurred communicating with the guest: {0}.")]
    Guest(String),

    #[error("Unsupported filesystem type: {0}")]
    UnsupportedFsType(String),

    #[error("{0}")]
    Fatal(FatalError),
}

impl VolumeError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, VolumeError::Fatal(_))
    }
}

impl From<FatalError> for VolumeError {
    fn from(err: FatalError) -> Self {
        VolumeError::Fatal(err)
    }
}
