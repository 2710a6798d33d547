//! Snapshot module for the node upgrade planner.
//!
//! This module handles the read-only inputs of planning:
//! - Cluster, node and cluster configuration snapshot types
//! - Loading snapshots from YAML or JSON files
//! - Computing node plan fingerprints for reporting

mod spec;
mod parser;
mod hash;

pub use spec::{
    AppliedNodePlan, Cluster, ClusterConfig, ClusterSpec, ClusterStatus, Node, NodeConfig,
    NodeRole, NodeStatus, RESTORE_ANNOTATION, Taint,
};
pub use parser::{SnapshotFormat, SnapshotParser};
pub use hash::PlanHasher;
