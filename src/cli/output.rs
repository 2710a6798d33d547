//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! plan comparisons in text or JSON.

use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::config::{PlanHasher, SnapshotFormat, SnapshotParser};
use crate::error::Result;
use crate::planner::{
    NodePlan, PlanDecision, classify, diff_process, is_share_mnt, update_only_change,
    upgrade_change,
};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Comparison of a new plan against the applied one.
#[derive(Debug, Serialize)]
pub struct ComparisonReport {
    /// Classification of the delta.
    pub decision: PlanDecision,
    /// Why a redeploy is needed, if it is.
    pub upgrade_reason: Option<String>,
    /// Why an update-only push is needed, if it is.
    pub update_reason: Option<String>,
    /// Fingerprint of the new plan.
    pub new_hash: String,
    /// Fingerprint of the applied plan.
    pub old_hash: Option<String>,
    /// Per-process status.
    pub processes: Vec<ProcessStatus>,
}

/// Status of one process across the two plans.
#[derive(Debug, Serialize)]
pub struct ProcessStatus {
    /// Process name.
    pub name: String,
    /// `added`, `removed`, `unchanged` or the changed field.
    pub status: String,
    /// Whether the process is a share-mnt helper.
    pub share_mnt: bool,
}

/// Process row for table display.
#[derive(Tabled)]
struct ProcessRow {
    #[tabled(rename = "Process")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Helper")]
    helper: String,
}

impl ComparisonReport {
    /// Compares `new_plan` with an optional applied plan.
    #[must_use]
    pub fn build(new_plan: &NodePlan, old_plan: Option<&NodePlan>) -> Self {
        let hasher = PlanHasher::new();

        let names: BTreeSet<&String> = new_plan
            .processes
            .keys()
            .chain(old_plan.iter().flat_map(|p| p.processes.keys()))
            .collect();

        let processes = names
            .into_iter()
            .map(|name| {
                let new = new_plan.processes.get(name);
                let old = old_plan.and_then(|p| p.processes.get(name));
                let status = match (old, new) {
                    (None, _) => String::from("added"),
                    (_, None) => String::from("removed"),
                    (Some(old), Some(new)) => diff_process(old, new)
                        .map_or_else(|| String::from("unchanged"), |c| format!("{} changed", c.field)),
                };
                ProcessStatus {
                    name: name.clone(),
                    status,
                    share_mnt: is_share_mnt(name),
                }
            })
            .collect();

        Self {
            decision: classify(Some(new_plan), old_plan),
            upgrade_reason: upgrade_change(Some(new_plan), old_plan).map(|c| c.to_string()),
            update_reason: update_only_change(Some(new_plan), old_plan).map(|c| c.to_string()),
            new_hash: hasher.hash_plan(new_plan),
            old_hash: old_plan.map(|p| hasher.hash_plan(p)),
            processes,
        }
    }
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a plan comparison for display.
    #[must_use]
    pub fn format_comparison(&self, report: &ComparisonReport) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Text => Self::format_comparison_text(report),
        }
    }

    /// Formats a comparison as text.
    fn format_comparison_text(report: &ComparisonReport) -> String {
        let mut output = String::new();

        let _ = writeln!(
            output,
            "\nDecision: {}",
            Self::format_decision(report.decision)
        );
        let hasher = PlanHasher::new();
        let _ = writeln!(output, "   New plan: {}", hasher.short_hash(&report.new_hash));
        let _ = writeln!(
            output,
            "   Applied plan: {}",
            report
                .old_hash
                .as_deref()
                .map_or_else(|| String::from("none"), |h| hasher.short_hash(h))
        );

        if let Some(reason) = report.upgrade_reason.as_ref().or(report.update_reason.as_ref()) {
            let _ = writeln!(output, "   Reason: {reason}");
        }
        output.push('\n');

        let rows: Vec<ProcessRow> = report
            .processes
            .iter()
            .map(|p| ProcessRow {
                name: p.name.clone(),
                status: Self::format_status(&p.status),
                helper: if p.share_mnt { String::from("share-mnt") } else { String::new() },
            })
            .collect();

        if !rows.is_empty() {
            output.push_str(&Table::new(rows).to_string());
            output.push('\n');
        }

        output
    }

    /// Formats a plan in the selected output format.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan cannot be serialized.
    pub fn format_plan(&self, plan: &NodePlan) -> Result<String> {
        let format = match self.format {
            OutputFormat::Json => SnapshotFormat::Json,
            OutputFormat::Text => SnapshotFormat::Yaml,
        };
        SnapshotParser::new().render(plan, format)
    }

    /// Formats a plan fingerprint.
    #[must_use]
    pub fn format_hash(&self, hash: &str) -> String {
        match self.format {
            OutputFormat::Json => serde_json::json!({ "hash": hash }).to_string(),
            OutputFormat::Text => hash.to_string(),
        }
    }

    /// Formats a decision with color.
    fn format_decision(decision: PlanDecision) -> String {
        match decision {
            PlanDecision::Redeploy => "redeploy".red().to_string(),
            PlanDecision::UpdateOnly => "update-only".yellow().to_string(),
            PlanDecision::NoChange => "no change".green().to_string(),
        }
    }

    /// Formats a process status with color.
    fn format_status(status: &str) -> String {
        match status {
            "unchanged" => status.dimmed().to_string(),
            "added" => status.green().to_string(),
            "removed" => status.red().to_string(),
            _ => status.yellow().to_string(),
        }
    }
}
