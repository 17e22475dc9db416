//! HAL trait definitions and implementations.
//!
//! [`ProcessOps`] is the one seam through which external tools are run.
//! [`LinuxHal`] spawns real processes; [`FakeHal`] records invocations and
//! replays scripted outcomes for tests.

pub mod fake_hal;
pub mod linux_hal;
pub mod path_probe;
pub mod process_ops;

pub use fake_hal::{FakeHal, FakeOutcome, Operation};
pub use linux_hal::{LinuxHal, DEFAULT_ROOT_HELPER};
pub use path_probe::exists_path;
pub use process_ops::{execute_shell_cmd, CommandInvocation, ProcessOps};
