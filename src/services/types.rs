//! Value types exchanged with external collaborators.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::planner::NodePlan;

/// OS type reported for Windows hosts.
pub const WINDOWS_OS_TYPE: &str = "windows";

/// Host runtime facts for one node.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct HostFacts {
    /// Operating system type, `"windows"` or anything else for Linux.
    #[serde(rename = "OSType")]
    pub os_type: String,
    /// Container runtime root directory.
    pub docker_root_dir: String,
}

/// Host facts keyed by node address.
pub type HostFactsByAddress = BTreeMap<String, HostFacts>;

/// Raw generated plans keyed by node address.
pub type GeneratedPlans = BTreeMap<String, NodePlan>;

/// Operating system family used for version option lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsKind {
    /// Linux service options.
    Linux,
    /// Windows service options.
    Windows,
}

impl HostFacts {
    /// Returns true if the host runs Windows.
    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os_type == WINDOWS_OS_TYPE
    }
}

impl std::fmt::Display for OsKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::Windows => write!(f, "windows"),
        }
    }
}
