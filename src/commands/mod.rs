//! CLI command handlers.

mod analyze;
mod retrieve;

pub(crate) use analyze::run_analyze_command;
pub(crate) use retrieve::run_retrieve_command;
