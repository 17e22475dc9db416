//! Grove guest agent core library.
//!
//! `grove-core` holds the filesystem kinds used to provision block volumes,
//! the fatal error reporter, and the configuration/logging/CLI plumbing shared
//! by the agent binary.

pub mod cli;
pub mod config;
pub mod fatal;
pub mod logging;
pub mod volume;

pub use grove_error::{FatalError, VolumeError, VolumeResult};
