//! Grove agent request handling.
//!
//! This is the only place a fatal volume outcome is turned into process exit.

use anyhow::Context;
use clap::Parser;
use grove_core::cli::{Cli, Command, VolumeArgs};
use grove_core::config::AgentConfig;
use grove_core::volume::{volume_fs, VolumeFilesystem};
use grove_core::{fatal, logging};
use grove_error::{VolumeError, VolumeResult};
use grove_hal::{exists_path, policy, ExecOptions, LinuxHal, ProcessOps};

/// Exit status for errors returned to the caller.
pub const RECOVERABLE_EXIT_CODE: i32 = 2;

pub fn run() -> anyhow::Result<i32> {
    let cli = Cli::parse();
    let cfg = AgentConfig::load_or_default(cli.config.as_deref())
        .context("failed to load agent configuration")?
        .with_overrides(cli.default_timeout, cli.root_helper.clone(), cli.log_file.clone());

    logging::init_with(cfg.log_file.as_deref());
    policy::init_default_timeout(cfg.default_timeout_secs);
    log::debug!("agent configuration: {:?}", cfg);

    let hal = LinuxHal::with_root_helper(cfg.root_helper);
    Ok(finish(dispatch(&hal, &cli.command)))
}

fn descriptor(volume: &VolumeArgs) -> VolumeResult<Box<dyn VolumeFilesystem>> {
    let kind: grove_core::volume::FsKind = volume.kind.into();
    volume_fs(kind.as_str(), volume.options.clone())
}

/// Execute one request and return what should be printed on success.
pub fn dispatch(hal: &dyn ProcessOps, command: &Command) -> VolumeResult<String> {
    match command {
        Command::Format { volume, timeout } => {
            descriptor(volume)?.format(hal, &volume.device, *timeout)?;
            Ok("OK".to_string())
        }
        Command::CheckFormat { volume } => {
            descriptor(volume)?.check_format(hal, &volume.device)?;
            Ok("OK".to_string())
        }
        Command::Resize { volume, online } => {
            descriptor(volume)?.resize(hal, &volume.device, *online)?;
            Ok("OK".to_string())
        }
        Command::ExistsPath {
            path,
            directory,
            as_root,
        } => Ok(exists_path(hal, path, *directory, *as_root).to_string()),
        Command::Exec {
            timeout,
            run_as_root,
            log_output_on_error,
            policy: bag,
            argv,
        } => {
            let mut opts = bag
                .as_ref()
                .map(ExecOptions::from_bag)
                .unwrap_or_default();
            if timeout.is_some() {
                opts.timeout = *timeout;
            }
            if *run_as_root {
                opts.run_as_root = Some(true);
            }
            if *log_output_on_error {
                opts.log_output_on_error = Some(true);
            }
            let argv: Vec<&str> = argv.iter().map(String::as_str).collect();
            Ok(hal.execute_with_options(&argv, &opts)?)
        }
    }
}

/// Print the outcome and pick the exit status. Fatal outcomes never return.
pub fn finish(result: VolumeResult<String>) -> i32 {
    match result {
        Ok(output) => {
            println!("{}", output.trim_end());
            0
        }
        Err(VolumeError::Fatal(err)) => fatal::report_and_exit(&err),
        Err(err) => {
            log::error!("request failed: {}", err);
            eprintln!("ERROR: {err}");
            RECOVERABLE_EXIT_CODE
        }
    }
}
