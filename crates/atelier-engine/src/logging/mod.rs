//! Logging bootstrap.
//!
//! Responsibilities:
//! - one-time global logger initialization
//! - env-driven filtering with a sensible default level

mod init;

pub use init::{LoggingConfig, init_logging};
