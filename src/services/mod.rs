//! Contracts for the external collaborators the planner calls.
//!
//! Each trait is a narrow seam over a remote or heavyweight system: the plan
//! generation engine, host introspection, credential augmentation, cluster
//! configuration assembly, the cluster token service and the service options
//! lookup. Calls are never retried here.

mod types;

use async_trait::async_trait;
use std::collections::BTreeMap;

#[cfg(test)]
use mockall::automock;

use crate::config::{Cluster, ClusterConfig, ClusterSpec, Node, Taint};
use crate::error::BoxError;
use crate::planner::{Process, ServiceOptions};

pub use types::{GeneratedPlans, HostFacts, HostFactsByAddress, OsKind, WINDOWS_OS_TYPE};

/// Processes keyed by name.
pub type Processes = BTreeMap<String, Process>;

/// Turns a cluster configuration and host facts into raw per-address plans.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PlanGenerator: Send + Sync {
    /// Generates plans for every node in `config`.
    async fn generate(
        &self,
        config: &ClusterConfig,
        hosts: &HostFactsByAddress,
        options: &ServiceOptions,
    ) -> Result<GeneratedPlans, BoxError>;
}

/// Reads host runtime facts reported for a node.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HostInspector: Send + Sync {
    /// Returns host facts keyed by address.
    async fn host_facts(&self, node: &Node) -> Result<HostFactsByAddress, BoxError>;
}

/// Injects credentials and node-specific settings into generated processes.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProcessAugmenter: Send + Sync {
    /// Adds credentials to Linux processes.
    ///
    /// Only the worker variant may replace security-sensitive fields.
    async fn augment(
        &self,
        token: &str,
        processes: Processes,
        is_worker: bool,
        hostname_override: &str,
        cluster: &Cluster,
    ) -> Result<Processes, BoxError>;

    /// Rewrites processes for Windows hosts without credentials.
    fn augment_windows(&self, processes: Processes) -> Processes;

    /// Appends taints to the kubelet arguments.
    fn inject_taints(&self, processes: Processes, taints: &[Taint]) -> Processes;
}

/// Builds the effective cluster configuration.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ConfigAssembler: Send + Sync {
    /// Assembles the engine configuration from the applied spec, resolving secrets.
    async fn assemble(
        &self,
        cluster: &Cluster,
        applied_spec: &ClusterSpec,
    ) -> Result<ClusterConfig, BoxError>;

    /// Narrows a configuration to the entries relevant to one worker node.
    fn filter_for_node(&self, config: ClusterConfig, node: &Node) -> ClusterConfig;
}

/// Issues cluster-scoped access tokens.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TokenService: Send + Sync {
    /// Returns the system token for a cluster, creating it if needed.
    async fn cluster_token(&self, cluster_name: &str) -> Result<String, BoxError>;
}

/// Looks up service options for a Kubernetes version.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VersionOptionsResolver: Send + Sync {
    /// Returns the options for `k8s_version` on `os`, if any are defined.
    async fn resolve(
        &self,
        k8s_version: &str,
        os: OsKind,
    ) -> Result<Option<serde_json::Value>, BoxError>;
}
