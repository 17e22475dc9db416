//! Grove Host Abstraction Layer (HAL).
//!
//! Everything that touches the host (spawning privileged tools, probing paths)
//! goes through the traits here so the volume layer can be tested with
//! [`FakeHal`] instead of real block devices.

pub mod hal;
pub mod policy;

pub use grove_error::{ExecError, ExecResult};
pub use hal::*;
pub use policy::{ExecOptions, ExecPolicy, DEFAULT_TIMEOUT_SECS};
