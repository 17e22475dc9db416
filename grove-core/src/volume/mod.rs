//! Volume filesystems.
//!
//! Each supported filesystem kind implements [`VolumeFilesystem`] by sequencing
//! privileged tools through [`ProcessOps`] and interpreting their output.
//! Whether a failed step is returned to the caller or escalated to a fatal
//! error is decided by the kind's [`KindPolicy`].

pub mod ext;
pub mod policy;
pub mod xfs;

pub use ext::ExtFs;
pub use policy::{FailureAction, KindPolicy, VolumeOp};
pub use xfs::XfsFs;

use grove_error::{ExecResult, VolumeError, VolumeResult};
use grove_hal::{ExecOptions, ProcessOps};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsKind {
    Ext3,
    Ext4,
    Xfs,
}

impl FsKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FsKind::Ext3 => "ext3",
            FsKind::Ext4 => "ext4",
            FsKind::Xfs => "xfs",
        }
    }

    pub fn is_ext_family(&self) -> bool {
        matches!(self, FsKind::Ext3 | FsKind::Ext4)
    }

    pub fn policy(&self) -> &'static KindPolicy {
        if self.is_ext_family() {
            &policy::EXT_POLICY
        } else {
            &policy::XFS_POLICY
        }
    }
}

impl fmt::Display for FsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FsKind {
    type Err = VolumeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ext3" => Ok(FsKind::Ext3),
            "ext4" => Ok(FsKind::Ext4),
            "xfs" => Ok(FsKind::Xfs),
            other => Err(VolumeError::UnsupportedFsType(other.to_string())),
        }
    }
}

/// Format / check / grow operations for one filesystem kind.
pub trait VolumeFilesystem: fmt::Debug + Send + Sync {
    fn kind(&self) -> FsKind;

    fn format_options(&self) -> &[String];

    /// Create the filesystem on `device`. `timeout` is in seconds; `None` uses the agent default.
    fn format(&self, hal: &dyn ProcessOps, device: &Path, timeout: Option<u64>)
        -> VolumeResult<()>;

    /// Verify that `device` already carries this filesystem.
    fn check_format(&self, hal: &dyn ProcessOps, device: &Path) -> VolumeResult<()>;

    /// Grow the filesystem to fill its (already extended) device.
    fn resize(&self, hal: &dyn ProcessOps, device: &Path, online: bool) -> VolumeResult<()>;
}

/// Build the filesystem descriptor for `kind` (`ext3`, `ext4` or `xfs`).
pub fn volume_fs(kind: &str, format_options: Vec<String>) -> VolumeResult<Box<dyn VolumeFilesystem>> {
    let fs: Box<dyn VolumeFilesystem> = match kind.parse::<FsKind>()? {
        FsKind::Ext3 => Box::new(ExtFs::ext3(format_options)),
        FsKind::Ext4 => Box::new(ExtFs::ext4(format_options)),
        FsKind::Xfs => Box::new(XfsFs::new(format_options)),
    };
    Ok(fs)
}

/// Options shared by every volume tool: escalate and log failures.
fn tool_options(timeout: Option<u64>) -> ExecOptions {
    let opts = ExecOptions::privileged();
    match timeout {
        Some(secs) => opts.with_timeout(secs),
        None => opts,
    }
}

fn run_tool(hal: &dyn ProcessOps, argv: &[String], opts: &ExecOptions) -> ExecResult<String> {
    let argv: Vec<&str> = argv.iter().map(String::as_str).collect();
    hal.execute_with_options(&argv, opts)
}

fn device_arg(device: &Path) -> String {
    device.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_maps_kinds() {
        let fs = volume_fs("ext3", vec![]).unwrap();
        assert_eq!(fs.kind(), FsKind::Ext3);
        let fs = volume_fs("ext4", vec!["-m".into(), "0".into()]).unwrap();
        assert_eq!(fs.kind(), FsKind::Ext4);
        assert_eq!(fs.format_options(), &["-m".to_string(), "0".to_string()]);
        let fs = volume_fs("xfs", vec![]).unwrap();
        assert_eq!(fs.kind(), FsKind::Xfs);
    }

    #[test]
    fn factory_rejects_unknown_kinds() {
        let err = volume_fs("btrfs", vec![]).unwrap_err();
        assert!(matches!(err, VolumeError::UnsupportedFsType(ref k) if k == "btrfs"));
    }

    #[test]
    fn kinds_round_trip_through_strings() {
        for kind in [FsKind::Ext3, FsKind::Ext4, FsKind::Xfs] {
            assert_eq!(kind.to_string().parse::<FsKind>().unwrap(), kind);
        }
    }
}
