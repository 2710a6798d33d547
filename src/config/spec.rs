//! Cluster and node snapshot types.
//!
//! These structs mirror the stored cluster and node objects the planner reads.
//! They are read-only inputs: the planner never writes cluster or node state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::planner::NodePlan;

/// Cluster annotation set to `"true"` while an etcd snapshot restore is in progress.
pub const RESTORE_ANNOTATION: &str = "rke.cattle.io/restore";

/// A cluster snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    /// Cluster name.
    pub name: String,
    /// Cluster annotations.
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// Observed cluster status.
    #[serde(default)]
    pub status: ClusterStatus,
}

/// Observed status of a cluster.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatus {
    /// The last applied cluster spec.
    #[serde(default)]
    pub applied_spec: ClusterSpec,
    /// Counter bumped on every node-affecting cluster change.
    #[serde(default)]
    pub node_version: u64,
}

/// Applied cluster spec.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    /// Kubernetes engine configuration.
    #[serde(default)]
    pub rke_config: Option<ClusterConfig>,
    /// Remaining spec fields, carried opaquely.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Cluster configuration handed to the plan generation engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    /// Kubernetes version.
    #[serde(default, rename = "kubernetesVersion")]
    pub version: String,
    /// Nodes the engine should plan for.
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
    /// Remaining configuration, carried opaquely.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Per-node entry of a cluster configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    /// Node name within the cluster configuration.
    #[serde(default)]
    pub node_name: String,
    /// Address the engine keys its output on.
    pub address: String,
    /// Hostname override passed to credential augmentation.
    #[serde(default)]
    pub hostname_override: String,
    /// Roles assigned to the node.
    #[serde(default)]
    pub role: Vec<NodeRole>,
    /// Taints applied to the node's kubelet.
    #[serde(default)]
    pub taints: Vec<Taint>,
}

/// Role a node serves in the cluster.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// Runs workloads.
    Worker,
    /// Runs an etcd member.
    Etcd,
    /// Runs the control plane.
    ControlPlane,
}

/// A kubelet taint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Taint {
    /// Taint key.
    pub key: String,
    /// Taint value.
    #[serde(default)]
    pub value: String,
    /// Taint effect.
    pub effect: String,
}

/// A node snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Node object name.
    pub name: String,
    /// Observed node status.
    #[serde(default)]
    pub status: NodeStatus,
}

/// Observed status of a node.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatus {
    /// The node's entry in the cluster configuration.
    #[serde(default)]
    pub node_config: Option<NodeConfig>,
    /// The plan last pushed to the node.
    #[serde(default)]
    pub node_plan: Option<AppliedNodePlan>,
}

/// The last plan pushed to a node.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppliedNodePlan {
    /// The applied plan.
    #[serde(default)]
    pub plan: Option<NodePlan>,
    /// Cluster node version the plan was built for.
    #[serde(default)]
    pub version: u64,
}

impl Cluster {
    /// Returns true if an etcd restore is in progress.
    #[must_use]
    pub fn restore_in_progress(&self) -> bool {
        self.annotations
            .get(RESTORE_ANNOTATION)
            .is_some_and(|value| value == "true")
    }
}

impl Node {
    /// Returns the last applied plan, if any.
    #[must_use]
    pub fn applied_plan(&self) -> Option<&NodePlan> {
        self.status.node_plan.as_ref().and_then(|p| p.plan.as_ref())
    }

    /// Returns true if the node only serves the worker role.
    #[must_use]
    pub fn is_worker_only(&self) -> bool {
        self.status.node_config.as_ref().is_some_and(|config| {
            !config.role.is_empty() && config.role.iter().all(|r| *r == NodeRole::Worker)
        })
    }
}

impl NodeConfig {
    /// Returns a copy of this entry serving every role.
    #[must_use]
    pub fn with_all_roles(&self) -> Self {
        Self {
            role: vec![NodeRole::Worker, NodeRole::Etcd, NodeRole::ControlPlane],
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_with_roles(roles: Vec<NodeRole>) -> Node {
        Node {
            name: String::from("m-1"),
            status: NodeStatus {
                node_config: Some(NodeConfig {
                    address: String::from("10.0.0.5"),
                    role: roles,
                    ..NodeConfig::default()
                }),
                ..NodeStatus::default()
            },
        }
    }

    #[test]
    fn test_restore_annotation() {
        let mut cluster = Cluster::default();
        assert!(!cluster.restore_in_progress());

        cluster
            .annotations
            .insert(String::from(RESTORE_ANNOTATION), String::from("false"));
        assert!(!cluster.restore_in_progress());

        cluster
            .annotations
            .insert(String::from(RESTORE_ANNOTATION), String::from("true"));
        assert!(cluster.restore_in_progress());
    }

    #[test]
    fn test_worker_only() {
        assert!(node_with_roles(vec![NodeRole::Worker]).is_worker_only());
        assert!(!node_with_roles(vec![NodeRole::Worker, NodeRole::Etcd]).is_worker_only());
        assert!(!node_with_roles(vec![]).is_worker_only());
        assert!(!Node::default().is_worker_only());
    }

    #[test]
    fn test_with_all_roles_leaves_original() {
        let node = node_with_roles(vec![NodeRole::Worker]);
        let config = node.status.node_config.as_ref().expect("config present");
        let combined = config.with_all_roles();

        assert_eq!(combined.role.len(), 3);
        assert_eq!(combined.address, config.address);
        assert_eq!(config.role, vec![NodeRole::Worker]);
    }

    #[test]
    fn test_role_names() {
        let roles: Vec<NodeRole> =
            serde_json::from_str(r#"["worker", "etcd", "controlplane"]"#).expect("valid roles");
        assert_eq!(roles, vec![NodeRole::Worker, NodeRole::Etcd, NodeRole::ControlPlane]);
    }
}
