//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// nodeplan - node plan comparison for cluster node upgrades.
#[derive(Parser, Debug)]
#[command(name = "nodeplan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true, env = "NODEPLAN_VERBOSE")]
    pub verbose: bool,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text", env = "NODEPLAN_OUTPUT")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify the difference between a new plan and the applied one.
    Compare {
        /// Newly built plan.
        #[arg(long = "new")]
        new_plan: PathBuf,

        /// Plan the node last applied; omit for a node that has none.
        #[arg(long = "old")]
        old_plan: Option<PathBuf>,
    },

    /// Add or overwrite an environment entry on one process of a plan.
    SetEnv {
        /// Plan to patch.
        #[arg(long)]
        plan: PathBuf,

        /// Process to patch.
        #[arg(long, default_value = "kubelet")]
        process: String,

        /// Entry in KEY=VALUE form.
        #[arg(long)]
        var: String,
    },

    /// Print the fingerprint of a plan.
    Hash {
        /// Plan to fingerprint.
        #[arg(long)]
        plan: PathBuf,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_without_old_plan() {
        let cli = Cli::try_parse_from(["nodeplan", "compare", "--new", "new.yaml"])
            .expect("arguments parse");

        match cli.command {
            Commands::Compare { new_plan, old_plan } => {
                assert_eq!(new_plan, PathBuf::from("new.yaml"));
                assert!(old_plan.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_set_env_defaults_to_kubelet() {
        let cli = Cli::try_parse_from([
            "nodeplan",
            "--output",
            "json",
            "set-env",
            "--plan",
            "plan.json",
            "--var",
            "A=1",
        ])
        .expect("arguments parse");

        assert!(matches!(cli.output, OutputFormat::Json));
        match cli.command {
            Commands::SetEnv { process, var, .. } => {
                assert_eq!(process, "kubelet");
                assert_eq!(var, "A=1");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
