//! CLI module for the node upgrade planner.
//!
//! This module provides the command-line interface for comparing,
//! patching and fingerprinting node plans.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::{ComparisonReport, OutputFormatter, ProcessStatus};
