//! Field-level equivalence rules for a single process.
//!
//! `Command`, `Env` and `Args` compare as presence sets. `Binds`,
//! `VolumesFrom` and `Publish` compare as ordered sequences. Labels,
//! network mode, PID mode and privilege compare as one projection, in which
//! an absent label map is not equal to an empty one. Everything else (restart policy, health check, registry auth) is left to
//! the update-only policy.

use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

use super::plan::Process;

/// Field group that differs between two processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessField {
    /// Container image.
    Image,
    /// Entry point command.
    Command,
    /// Environment entries.
    Env,
    /// Command arguments.
    Args,
    /// Host bind mounts.
    Binds,
    /// Inherited volumes.
    VolumesFrom,
    /// Published ports.
    Publish,
    /// Labels, network mode, PID mode or privilege.
    Runtime,
}

/// First difference found between two versions of a process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessChange {
    /// Process name.
    pub process: String,
    /// Field group that changed.
    pub field: ProcessField,
    /// Old value, rendered for display.
    pub old_value: String,
    /// New value, rendered for display.
    pub new_value: String,
}

/// The redeploy-sensitive runtime fields of a process.
#[derive(Debug, PartialEq, Eq)]
struct CompareProcess<'a> {
    labels: Option<&'a BTreeMap<String, String>>,
    network_mode: &'a str,
    pid_mode: &'a str,
    privileged: bool,
}

impl<'a> CompareProcess<'a> {
    fn from_process(process: &'a Process) -> Self {
        Self {
            labels: process.labels.as_ref(),
            network_mode: &process.network_mode,
            pid_mode: &process.pid_mode,
            privileged: process.privileged,
        }
    }
}

/// Returns true if redeploying `new` in place of `old` would be observably different.
///
/// Emits one `info` event naming the first differing field.
#[must_use]
pub fn process_changed(old: &Process, new: &Process) -> bool {
    match diff_process(old, new) {
        Some(change) => {
            info!(
                process = %change.process,
                field = %change.field,
                old = %change.old_value,
                new = %change.new_value,
                "{} changed for [{}]", change.field, change.process
            );
            true
        }
        None => false,
    }
}

/// Finds the first redeploy-sensitive difference between two processes.
///
/// Checks run in a fixed order and the first mismatch wins.
#[must_use]
pub fn diff_process(old: &Process, new: &Process) -> Option<ProcessChange> {
    let change = |field, old_value: String, new_value: String| ProcessChange {
        process: new.name.clone(),
        field,
        old_value,
        new_value,
    };

    if old.image != new.image {
        return Some(change(ProcessField::Image, old.image.clone(), new.image.clone()));
    }

    let unordered = [
        (ProcessField::Command, &old.command, &new.command),
        (ProcessField::Env, &old.env, &new.env),
        (ProcessField::Args, &old.args, &new.args),
    ];
    for (field, olds, news) in unordered {
        if slice_changed_unordered(olds, news) {
            return Some(change(field, format!("{olds:?}"), format!("{news:?}")));
        }
    }

    let ordered = [
        (ProcessField::Binds, &old.binds, &new.binds),
        (ProcessField::VolumesFrom, &old.volumes_from, &new.volumes_from),
        (ProcessField::Publish, &old.publish, &new.publish),
    ];
    for (field, olds, news) in ordered {
        if slice_changed(olds, news) {
            return Some(change(field, format!("{olds:?}"), format!("{news:?}")));
        }
    }

    let old_runtime = CompareProcess::from_process(old);
    let new_runtime = CompareProcess::from_process(new);
    if old_runtime != new_runtime {
        return Some(change(
            ProcessField::Runtime,
            format!("{old_runtime:?}"),
            format!("{new_runtime:?}"),
        ));
    }

    None
}

/// Presence-set comparison: order and duplicates are ignored.
fn slice_changed_unordered(olds: &[String], news: &[String]) -> bool {
    let old_set: BTreeSet<&str> = olds.iter().map(String::as_str).collect();
    let new_set: BTreeSet<&str> = news.iter().map(String::as_str).collect();
    old_set != new_set
}

/// Ordered comparison. An absent list decodes as empty, so absent and empty match.
fn slice_changed(olds: &[String], news: &[String]) -> bool {
    olds != news
}

impl std::fmt::Display for ProcessField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Image => "image",
            Self::Command => "command",
            Self::Env => "env",
            Self::Args => "args",
            Self::Binds => "binds",
            Self::VolumesFrom => "volumesFrom",
            Self::Publish => "publish",
            Self::Runtime => "process",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for ProcessChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} changed for [{}] old: {} new: {}",
            self.field, self.process, self.old_value, self.new_value
        )
    }
}
