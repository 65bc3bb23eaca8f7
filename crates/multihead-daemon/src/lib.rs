//! Daemon for multihead.
//!
//! Loads configuration, builds the screen layout and device registry, and
//! runs the single-owner event loop that funnels every transport's events
//! into the input translator.

pub mod config;
pub mod daemon;
pub mod error;
pub mod setup;

pub use config::Config;
pub use daemon::{Daemon, DaemonEvent, DaemonStatus};
pub use error::DaemonError;
