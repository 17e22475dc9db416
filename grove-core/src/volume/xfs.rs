//! XFS volumes. Every failed step is fatal.

use super::policy::VolumeOp;
use super::{device_arg, run_tool, tool_options, FsKind, VolumeFilesystem};
use grove_error::{fatal_error, VolumeError, VolumeResult};
use grove_hal::ProcessOps;
use std::path::Path;

const NOT_XFS: &str = "not a valid XFS filesystem";

/// Tools run, in order, to grow an XFS volume.
/// Earlier steps are not undone when a later one fails.
const RESIZE_STEPS: [&str; 4] = ["xfs_repair", "mount", "xfs_growfs", "unmount"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XfsFs {
    format_options: Vec<String>,
}

impl XfsFs {
    pub fn new(format_options: Vec<String>) -> Self {
        Self { format_options }
    }

    pub fn format_command(&self, device: &Path) -> Vec<String> {
        let mut argv = vec!["mkfs.xfs".to_string()];
        argv.extend(self.format_options.iter().cloned());
        argv.push(device_arg(device));
        argv
    }

    /// The descriptor's options name the probe tool and its flags; the device goes last.
    pub fn check_command(&self, device: &Path) -> Vec<String> {
        let mut argv = self.format_options.clone();
        argv.push(device_arg(device));
        argv
    }
}

impl VolumeFilesystem for XfsFs {
    fn kind(&self) -> FsKind {
        FsKind::Xfs
    }

    fn format_options(&self) -> &[String] {
        &self.format_options
    }

    fn format(&self, hal: &dyn ProcessOps, device: &Path, timeout: Option<u64>) -> VolumeResult<()> {
        log::info!("Formatting {} as xfs", device.display());
        run_tool(hal, &self.format_command(device), &tool_options(timeout)).map_err(|err| {
            FsKind::Xfs.policy().on_failure(VolumeOp::Format, err, |_| {
                fatal_error!(
                    "Could not format device: {} ({}).",
                    "Could not format device: {} ({}).",
                    device.display(),
                    FsKind::Xfs
                )
            })
        })?;
        Ok(())
    }

    // Success without the "not valid" marker counts as unformatted.
    fn check_format(&self, hal: &dyn ProcessOps, device: &Path) -> VolumeResult<()> {
        let output = run_tool(hal, &self.check_command(device), &tool_options(None)).map_err(
            |err| {
                FsKind::Xfs
                    .policy()
                    .on_failure(VolumeOp::CheckFormat, err, |_| {
                        fatal_error!(
                            "Could not check format device: {} ({}).",
                            "Could not check format device: {} ({}).",
                            device.display(),
                            FsKind::Xfs
                        )
                    })
            },
        )?;

        if !output.contains(NOT_XFS) {
            return Err(VolumeError::Guest(format!(
                "Volume '{}' does not appear to be formatted.",
                device.display()
            )));
        }
        Ok(())
    }

    fn resize(&self, hal: &dyn ProcessOps, device: &Path, _online: bool) -> VolumeResult<()> {
        let opts = tool_options(None);
        let dev = device_arg(device);
        for tool in RESIZE_STEPS {
            let argv = [tool.to_string(), dev.clone()];
            run_tool(hal, &argv, &opts).map_err(|err| {
                FsKind::Xfs.policy().on_failure(VolumeOp::Resize, err, |_| {
                    fatal_error!(
                        "Error when check {} device: {} ({}).",
                        "Error when check {} device: {} ({}).",
                        tool,
                        device.display(),
                        FsKind::Xfs
                    )
                })
            })?;
        }
        Ok(())
    }
}
