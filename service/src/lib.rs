//! Host-side plumbing shared by Solar auth binaries: command line/environment
//! configuration and console logging.

pub mod config;
pub mod logging;

pub use config::{Command, Config};
pub use logging::Logger;
