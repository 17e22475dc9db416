//! ext3 / ext4 volumes.

use super::policy::VolumeOp;
use super::{device_arg, run_tool, tool_options, FsKind, VolumeFilesystem};
use grove_error::{fatal_error, ExecError, VolumeError, VolumeResult};
use grove_hal::ProcessOps;
use std::path::Path;

/// Marker `dumpe2fs` prints for a journalled ext filesystem.
const HAS_JOURNAL: &str = "has_journal";
/// Error text meaning the device holds no ext superblock at all.
const WRONG_MAGIC: &str = "Wrong magic number";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtFs {
    kind: FsKind,
    format_options: Vec<String>,
}

impl ExtFs {
    pub fn ext3(format_options: Vec<String>) -> Self {
        Self {
            kind: FsKind::Ext3,
            format_options,
        }
    }

    pub fn ext4(format_options: Vec<String>) -> Self {
        Self {
            kind: FsKind::Ext4,
            format_options,
        }
    }

    pub fn format_command(&self, device: &Path) -> Vec<String> {
        let mut argv = vec![
            "mkfs".to_string(),
            "--type".to_string(),
            self.kind.as_str().to_string(),
        ];
        argv.extend(self.format_options.iter().cloned());
        argv.push(device_arg(device));
        argv
    }

    pub fn check_command(&self, device: &Path) -> Vec<String> {
        let mut argv = vec!["dumpe2fs".to_string()];
        argv.extend(self.format_options.iter().cloned());
        argv.push(device_arg(device));
        argv
    }
}

impl VolumeFilesystem for ExtFs {
    fn kind(&self) -> FsKind {
        self.kind
    }

    fn format_options(&self) -> &[String] {
        &self.format_options
    }

    fn format(&self, hal: &dyn ProcessOps, device: &Path, timeout: Option<u64>) -> VolumeResult<()> {
        log::info!("Formatting {} as {}", device.display(), self.kind);
        let policy = self.kind.policy();
        run_tool(hal, &self.format_command(device), &tool_options(timeout)).map_err(|err| {
            policy.on_failure(VolumeOp::Format, err, |_| {
                fatal_error!(
                    "Could not format device: {} ({}).",
                    "Could not format device: {} ({}).",
                    device.display(),
                    self.kind
                )
            })
        })?;
        Ok(())
    }

    fn check_format(&self, hal: &dyn ProcessOps, device: &Path) -> VolumeResult<()> {
        let policy = self.kind.policy();
        let output = run_tool(hal, &self.check_command(device), &tool_options(None)).map_err(
            |err| {
                policy.on_failure(VolumeOp::CheckFormat, err, |err| {
                    if err.to_string().contains(WRONG_MAGIC) {
                        fatal_error!(
                            "Device '{}' did not seem to be '{}'.",
                            "Device '{}' did not seem to be '{}'.",
                            device.display(),
                            self.kind
                        )
                    } else {
                        fatal_error!(
                            "Volume '{}' was not formatted as '{}'.",
                            "Volume '{}' was not formatted as '{}'.",
                            device.display(),
                            self.kind
                        )
                    }
                })
            },
        )?;

        if !output.contains(HAS_JOURNAL) {
            return Err(VolumeError::NotFormatted {
                device: device_arg(device),
            });
        }
        Ok(())
    }

    fn resize(&self, hal: &dyn ProcessOps, device: &Path, online: bool) -> VolumeResult<()> {
        let policy = self.kind.policy();
        let opts = tool_options(None);
        let dev = device_arg(device);
        let fail = |err: ExecError| {
            policy.on_failure(VolumeOp::Resize, err, |err| {
                fatal_error!(
                    "Could not resize device: {} ({}): {}",
                    "Could not resize device: {} ({}): {}",
                    device.display(),
                    self.kind,
                    err
                )
            })
        };

        if !online {
            let check = ["e2fsck".to_string(), "-f".to_string(), "-p".to_string(), dev.clone()];
            run_tool(hal, &check, &opts).map_err(&fail)?;
        }
        let grow = ["resize2fs".to_string(), dev];
        run_tool(hal, &grow, &opts).map_err(&fail)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grove_hal::{FakeHal, FakeOutcome, Operation};

    const DEVICE: &str = "/dev/sdb1";

    fn strings(argv: &[&str]) -> Vec<String> {
        argv.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn format_runs_mkfs_with_kind_and_escalation() {
        let hal = FakeHal::new();
        let fs = ExtFs::ext4(strings(&["-m", "0"]));

        fs.format(&hal, Path::new(DEVICE), None).unwrap();

        let ops = hal.operations();
        assert_eq!(ops.len(), 1);
        assert_eq!(
            ops[0],
            Operation::Command {
                argv: strings(&["mkfs", "--type", "ext4", "-m", "0", DEVICE]),
                timeout_secs: grove_hal::policy::default_timeout_secs(),
                run_as_root: true,
                log_output_on_error: true,
            }
        );
    }

    #[test]
    fn format_honours_timeout_and_propagates_failure() {
        let hal = FakeHal::new();
        hal.push_outcome(FakeOutcome::non_zero_exit(1, "mkfs: device busy"));
        let fs = ExtFs::ext3(vec![]);

        let err = fs.format(&hal, Path::new(DEVICE), Some(600)).unwrap_err();

        assert!(!err.is_fatal());
        match err {
            VolumeError::Exec(exec) => {
                assert_eq!(exec.exit_code(), Some(1));
                assert_eq!(exec.combined_output(), "mkfs: device busy");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(hal.has_operation(|op| matches!(
            op,
            Operation::Command { timeout_secs: 600, argv, .. } if argv[2] == "ext3"
        )));
    }

    #[test]
    fn check_format_accepts_journalled_device() {
        let hal = FakeHal::new();
        hal.push_outcome(FakeOutcome::success(
            "Filesystem features:      has_journal ext_attr resize_inode dir_index\n",
        ));
        let fs = ExtFs::ext4(vec![]);

        fs.check_format(&hal, Path::new(DEVICE)).unwrap();
        assert_eq!(hal.commands(), vec![strings(&["dumpe2fs", DEVICE])]);
    }

    #[test]
    fn check_format_without_journal_is_recoverable() {
        let hal = FakeHal::new();
        hal.push_outcome(FakeOutcome::success("Filesystem features:      ext_attr\n"));
        let fs = ExtFs::ext4(vec![]);

        let err = fs.check_format(&hal, Path::new(DEVICE)).unwrap_err();
        assert!(matches!(err, VolumeError::NotFormatted { ref device } if device == DEVICE));
        assert_eq!(err.to_string(), "Volume '/dev/sdb1' was not formatted.");
    }

    #[test]
    fn check_format_wrong_magic_is_fatal() {
        let hal = FakeHal::new();
        hal.push_outcome(FakeOutcome::non_zero_exit(
            1,
            "dumpe2fs: Wrong magic number for ext2 filesystem",
        ));
        let fs = ExtFs::ext4(vec![]);

        match fs.check_format(&hal, Path::new(DEVICE)).unwrap_err() {
            VolumeError::Fatal(fatal) => assert_eq!(
                fatal.log_message(),
                "Device '/dev/sdb1' did not seem to be 'ext4'."
            ),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn check_format_other_failures_are_fatal() {
        for outcome in [
            FakeOutcome::non_zero_exit(8, "Permission denied"),
            FakeOutcome::Timeout,
            FakeOutcome::LaunchFailure,
        ] {
            let hal = FakeHal::new();
            hal.push_outcome(outcome);
            let err = ExtFs::ext3(vec![])
                .check_format(&hal, Path::new(DEVICE))
                .unwrap_err();
            match err {
                VolumeError::Fatal(fatal) => assert_eq!(
                    fatal.exc_message(),
                    "Volume '/dev/sdb1' was not formatted as 'ext3'."
                ),
                other => panic!("unexpected: {other:?}"),
            }
        }
    }

    #[test]
    fn offline_resize_checks_before_growing() {
        let hal = FakeHal::new();
        ExtFs::ext4(vec![])
            .resize(&hal, Path::new(DEVICE), false)
            .unwrap();

        assert_eq!(
            hal.commands(),
            vec![
                strings(&["e2fsck", "-f", "-p", DEVICE]),
                strings(&["resize2fs", DEVICE]),
            ]
        );
    }

    #[test]
    fn offline_resize_aborts_when_check_fails() {
        let hal = FakeHal::new();
        hal.push_outcome(FakeOutcome::non_zero_exit(4, "errors left uncorrected"));

        let err = ExtFs::ext4(vec![])
            .resize(&hal, Path::new(DEVICE), false)
            .unwrap_err();

        assert!(matches!(err, VolumeError::Exec(ExecError::NonZeroExit { exit_code: 4, .. })));
        assert_eq!(hal.commands(), vec![strings(&["e2fsck", "-f", "-p", DEVICE])]);
    }

    #[test]
    fn online_resize_only_grows() {
        let hal = FakeHal::new();
        hal.push_outcome(FakeOutcome::Timeout);

        let err = ExtFs::ext4(vec![])
            .resize(&hal, Path::new(DEVICE), true)
            .unwrap_err();

        assert!(matches!(err, VolumeError::Exec(ExecError::Timeout { .. })));
        assert_eq!(hal.commands(), vec![strings(&["resize2fs", DEVICE])]);
    }
}
