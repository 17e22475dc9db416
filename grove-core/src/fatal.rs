//! Fatal error reporter.
//!
//! The volume layer never exits on its own; it returns [`VolumeError::Fatal`]
//! and the agent's request handler hands the error to [`report_and_exit`].
//!
//! [`VolumeError::Fatal`]: grove_error::VolumeError::Fatal

use grove_error::FatalError;
use std::io::{self, Write};

/// Exit status used for every fatal outcome.
pub const FATAL_EXIT_CODE: i32 = 1;

/// Write the fatal banner and backtrace to `out`.
pub fn write_report(out: &mut dyn Write, err: &FatalError) -> io::Result<()> {
    writeln!(
        out,
        "FATAL ERROR: {}\nExc: {}",
        err.exc_message(),
        err.backtrace()
    )?;
    out.flush()
}

/// Log `err`, dump it with its backtrace to stderr and terminate the process.
pub fn report_and_exit(err: &FatalError) -> ! {
    log::error!("{}", err.log_message());
    log::logger().flush();
    let _ = write_report(&mut io::stderr().lock(), err);
    std::process::exit(FATAL_EXIT_CODE);
}

#[cfg(test)]
mod tests {
    use super::*;
    use grove_error::fatal_error;

    #[test]
    fn report_contains_banner_and_trace() {
        let err = fatal_error!(
            "Could not format device: {} ({}).",
            "Could not format device: {} ({}).",
            "/dev/sdc",
            "xfs"
        );
        let mut buf = Vec::new();
        write_report(&mut buf, &err).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("FATAL ERROR: Could not format device: /dev/sdc (xfs).\nExc: "));
        assert!(text.len() > "FATAL ERROR: \nExc: ".len() + err.exc_message().len());
    }
}
