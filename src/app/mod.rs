//! Binary-side plumbing: settings resolution, terminal setup, progress UI
//! and exit codes.

pub(crate) mod config_runtime;
pub(crate) mod exit_handler;
pub(crate) mod progress_manager;
pub(crate) mod terminal;
