//! Logging bootstrap.
//!
//! The engine itself only talks to the `log` facade. This module installs an
//! `env_logger` backend for binaries and tests that want one.

mod init;

pub use init::{init_logging, LoggingConfig};
