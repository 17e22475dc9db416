//! Per-kind failure policy: which failed operations are returned to the caller
//! and which terminate the agent.

use grove_error::{ExecError, FatalError, VolumeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeOp {
    Format,
    CheckFormat,
    Resize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    /// Return the command error to the caller.
    Propagate,
    /// Escalate to a fatal error; the agent exits.
    Terminate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindPolicy {
    pub format: FailureAction,
    pub check_format: FailureAction,
    pub resize: FailureAction,
}

pub const EXT_POLICY: KindPolicy = KindPolicy {
    format: FailureAction::Propagate,
    check_format: FailureAction::Terminate,
    resize: FailureAction::Propagate,
};

pub const XFS_POLICY: KindPolicy = KindPolicy {
    format: FailureAction::Terminate,
    check_format: FailureAction::Terminate,
    resize: FailureAction::Terminate,
};

impl KindPolicy {
    pub fn action(&self, op: VolumeOp) -> FailureAction {
        match op {
            VolumeOp::Format => self.format,
            VolumeOp::CheckFormat => self.check_format,
            VolumeOp::Resize => self.resize,
        }
    }

    /// Map a failed step of `op` to the error the caller sees.
    ///
    /// `fatal` builds the fatal report and is only called when the policy terminates.
    pub fn on_failure(
        &self,
        op: VolumeOp,
        err: ExecError,
        fatal: impl FnOnce(&ExecError) -> FatalError,
    ) -> VolumeError {
        match self.action(op) {
            FailureAction::Propagate => VolumeError::Exec(err),
            FailureAction::Terminate => VolumeError::Fatal(fatal(&err)),
        }
    }
}
