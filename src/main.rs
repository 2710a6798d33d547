//! nodeplan CLI entrypoint.
//!
//! This is the main entrypoint for the nodeplan command-line tool.

use std::path::Path;
use std::process::ExitCode;

use node_upgrade_planner::cli::{Cli, Commands, ComparisonReport, OutputFormatter};
use node_upgrade_planner::config::{PlanHasher, SnapshotParser};
use node_upgrade_planner::error::{ConfigError, Result, UpgraderError};
use node_upgrade_planner::planner::{NodePlan, upsert_env_var};

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let parser = SnapshotParser::new();
    if let Err(e) = parser.load_dotenv() {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let cli = Cli::parse();

    init_logging(cli.verbose, cli.log_json);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli, &parser)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Main async entry point.
async fn run(cli: Cli, parser: &SnapshotParser) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);

    match cli.command {
        Commands::Compare { new_plan, old_plan } => {
            cmd_compare(parser, &new_plan, old_plan.as_deref(), &formatter)
        }
        Commands::SetEnv { plan, process, var } => {
            cmd_set_env(parser, &plan, &process, &var, &formatter)
        }
        Commands::Hash { plan } => cmd_hash(parser, &plan, &formatter),
    }
}

/// Compare a new plan with the applied one.
fn cmd_compare(
    parser: &SnapshotParser,
    new_path: &Path,
    old_path: Option<&Path>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let new_plan: NodePlan = parser.load_file(new_path)?;
    let old_plan: Option<NodePlan> = old_path.map(|p| parser.load_file(p)).transpose()?;

    if old_plan.is_none() {
        debug!("No applied plan given, treating node as never applied");
    }

    let report = ComparisonReport::build(&new_plan, old_plan.as_ref());
    info!(decision = %report.decision, "Compared plans");

    println!("{}", formatter.format_comparison(&report));
    Ok(())
}

/// Set an environment entry on one process.
fn cmd_set_env(
    parser: &SnapshotParser,
    plan_path: &Path,
    process_name: &str,
    var: &str,
    formatter: &OutputFormatter,
) -> Result<()> {
    if !var.contains('=') {
        return Err(ConfigError::invalid_argument("var", "expected KEY=VALUE").into());
    }

    let mut plan: NodePlan = parser.load_file(plan_path)?;

    let process = plan.processes.remove(process_name).ok_or_else(|| {
        UpgraderError::internal(format!(
            "process [{process_name}] not found in {}",
            plan_path.display()
        ))
    })?;
    plan.processes
        .insert(process_name.to_string(), upsert_env_var(process, var));

    println!("{}", formatter.format_plan(&plan)?);
    Ok(())
}

/// Print a plan fingerprint.
fn cmd_hash(parser: &SnapshotParser, plan_path: &Path, formatter: &OutputFormatter) -> Result<()> {
    let plan: NodePlan = parser.load_file(plan_path)?;
    let hash = PlanHasher::new().hash_plan(&plan);

    println!("{}", formatter.format_hash(&hash));
    Ok(())
}
