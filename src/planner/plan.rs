//! Node plan types.
//!
//! A node plan is the full desired on-node execution state at one point in
//! time: a set of named processes plus the files to place on the node.
//! Plans are built fresh on every pass and never mutated once stored.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the kubelet process in a node plan.
pub const KUBELET_PROCESS: &str = "kubelet";

/// Name fragment marking share-mnt helper processes.
pub const SHARE_MNT_MARKER: &str = "share-mnt";

/// Returns true if a process name belongs to a share-mnt helper container.
#[must_use]
pub fn is_share_mnt(name: &str) -> bool {
    name.contains(SHARE_MNT_MARKER)
}

/// The desired execution state of one node.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodePlan {
    /// Processes keyed by process name.
    #[serde(default)]
    pub processes: BTreeMap<String, Process>,
    /// Files to write on the node, in order.
    #[serde(default)]
    pub files: Vec<File>,
}

/// A single container-like unit of work on a node.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    /// Process name, unique within a plan.
    #[serde(default)]
    pub name: String,
    /// Container image.
    #[serde(default)]
    pub image: String,
    /// Entry point command.
    #[serde(default)]
    pub command: Vec<String>,
    /// Command arguments.
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment entries in `KEY=VALUE` form.
    #[serde(default)]
    pub env: Vec<String>,
    /// Host bind mounts.
    #[serde(default)]
    pub binds: Vec<String>,
    /// Containers to inherit volumes from.
    #[serde(default)]
    pub volumes_from: Vec<String>,
    /// Published ports.
    #[serde(default)]
    pub publish: Vec<String>,
    /// Container labels. An absent map is distinct from an empty one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    /// Network mode.
    #[serde(default)]
    pub network_mode: String,
    /// PID namespace mode.
    #[serde(default)]
    pub pid_mode: String,
    /// Whether the container runs privileged.
    #[serde(default)]
    pub privileged: bool,
    /// Health check settings.
    #[serde(default)]
    pub health_check: HealthCheck,
    /// Restart policy name.
    #[serde(default)]
    pub restart_policy: String,
    /// Opaque reference to registry credentials for the image.
    #[serde(default)]
    pub image_registry_auth_config: String,
}

/// Health check settings of a process.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthCheck {
    /// URL probed for health.
    #[serde(default)]
    pub url: String,
}

/// A file placed on the node.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct File {
    /// Destination path.
    pub name: String,
    /// File contents.
    #[serde(default)]
    pub contents: String,
}

impl NodePlan {
    /// Creates a plan from processes with no files.
    #[must_use]
    pub const fn from_processes(processes: BTreeMap<String, Process>) -> Self {
        Self {
            processes,
            files: Vec::new(),
        }
    }

    /// Returns the named process, if present.
    #[must_use]
    pub fn process(&self, name: &str) -> Option<&Process> {
        self.processes.get(name)
    }

    /// Returns the number of processes in the plan.
    #[must_use]
    pub fn process_count(&self) -> usize {
        self.processes.len()
    }
}

impl Process {
    /// Creates a process with a name and image.
    #[must_use]
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            ..Self::default()
        }
    }

    /// Sets a label, creating the label map if absent.
    pub fn set_label(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.labels
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
    }

    /// Returns the value of an environment entry by key.
    #[must_use]
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|entry| env_key(entry) == key)
            .map(|entry| entry.split_once('=').map_or("", |(_, v)| v))
    }
}

/// Returns the key part of a `KEY=VALUE` environment entry.
#[must_use]
pub fn env_key(entry: &str) -> &str {
    entry.split_once('=').map_or(entry, |(k, _)| k)
}
