//! CLI argument parsing for the Grove agent.

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::volume::FsKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Ext3,
    Ext4,
    Xfs,
}

impl From<KindArg> for FsKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Ext3 => FsKind::Ext3,
            KindArg::Ext4 => FsKind::Ext4,
            KindArg::Xfs => FsKind::Xfs,
        }
    }
}

/// Parse a JSON object of execution options (`timeout`, `run_as_root`, `log_output_on_error`).
pub fn parse_policy_bag(text: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("expected a JSON object".to_string()),
        Err(err) => Err(err.to_string()),
    }
}

#[derive(Debug, Parser)]
#[command(name = "grove-agent")]
#[command(about = "Grove guest agent: format, verify and grow block volumes")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Agent configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Privilege escalation wrapper (empty string disables escalation)
    #[arg(long, global = true)]
    pub root_helper: Option<String>,

    /// Timeout in seconds for commands that do not set one
    #[arg(long, global = true)]
    pub default_timeout: Option<u64>,
}

#[derive(Debug, Clone, Args)]
pub struct VolumeArgs {
    /// Filesystem kind
    #[arg(long, value_enum)]
    pub kind: KindArg,

    /// Block device (e.g. /dev/sdb1)
    #[arg(long)]
    pub device: PathBuf,

    /// Filesystem tool option (repeatable, passed through in order)
    #[arg(long = "option", allow_hyphen_values = true)]
    pub options: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a filesystem on a device
    Format {
        #[command(flatten)]
        volume: VolumeArgs,

        /// Timeout in seconds for the format tool
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Verify that a device already carries the expected filesystem
    CheckFormat {
        #[command(flatten)]
        volume: VolumeArgs,
    },

    /// Grow a filesystem after its device was extended
    Resize {
        #[command(flatten)]
        volume: VolumeArgs,

        /// The filesystem is mounted; skip the offline consistency check
        #[arg(long)]
        online: bool,
    },

    /// Report whether a path exists
    ExistsPath {
        path: PathBuf,

        /// Expect a directory rather than a regular file
        #[arg(long)]
        directory: bool,

        /// Retry with escalated privileges if the path is not visible
        #[arg(long)]
        as_root: bool,
    },

    /// Run one command through the bounded executor and print its output
    Exec {
        /// Timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        #[arg(long)]
        run_as_root: bool,

        #[arg(long)]
        log_output_on_error: bool,

        /// Execution options as a JSON object; the flags above take precedence
        #[arg(long, value_parser = parse_policy_bag)]
        policy: Option<Map<String, Value>>,

        /// Command and arguments
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        argv: Vec<String>,
    },
}
