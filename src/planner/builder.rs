//! Node plan assembly.
//!
//! The builder selects the slice of cluster configuration relevant to one
//! node, hands it to the plan generation engine, and post-processes the
//! engine's output for that node's address: credentials, taints and, on
//! workers, the etcd restore marker.

use tracing::debug;

use crate::config::{Cluster, ClusterConfig, Node, NodeConfig};
use crate::error::{PlanError, Result};
use crate::services::{
    ConfigAssembler, GeneratedPlans, HostFacts, HostFactsByAddress, HostInspector, PlanGenerator,
    ProcessAugmenter, Processes, TokenService, VersionOptionsResolver,
};

use super::env::upsert_env_var;
use super::options::resolve_service_options;
use super::plan::{KUBELET_PROCESS, NodePlan, env_key};

/// Environment key carrying the restore marker on the kubelet process.
pub const RESTORE_ENV_KEY: &str = "CATTLE_ETCD_RESTORE_GENERATION";

/// External collaborators used to build node plans.
#[derive(Clone, Copy)]
pub struct PlanServices<'a> {
    /// Plan generation engine.
    pub generator: &'a dyn PlanGenerator,
    /// Host introspection.
    pub hosts: &'a dyn HostInspector,
    /// Credential augmentation.
    pub augmenter: &'a dyn ProcessAugmenter,
    /// Cluster configuration assembly.
    pub assembler: &'a dyn ConfigAssembler,
    /// Cluster token service.
    pub tokens: &'a dyn TokenService,
    /// Version options lookup.
    pub options: &'a dyn VersionOptionsResolver,
}

/// Builds desired node plans.
pub struct PlanBuilder<'a> {
    services: PlanServices<'a>,
}

/// Host facts and address resolved for a node.
struct NodeHost<'a> {
    node_config: &'a NodeConfig,
    facts: HostFacts,
    by_address: HostFactsByAddress,
}

impl<'a> PlanBuilder<'a> {
    /// Creates a new plan builder.
    #[must_use]
    pub const fn new(services: PlanServices<'a>) -> Self {
        Self { services }
    }

    /// Builds the plan for a node serving worker, etcd and control-plane roles.
    ///
    /// The cluster configuration is reduced to a single entry for this node
    /// with all three roles, regardless of the roles recorded on the node.
    /// The returned plan carries no files.
    ///
    /// # Errors
    ///
    /// Returns an error if host facts, configuration, generation, the
    /// cluster token or credential augmentation fail, or if the engine
    /// produced no plan for the node's address.
    pub async fn control_plane_plan(&self, node: &Node, cluster: &Cluster) -> Result<NodePlan> {
        let mut config = self.assemble(cluster).await?;
        let node_config = node_config(node)?;
        config.nodes = vec![node_config.with_all_roles()];

        let host = self.host(node).await?;
        debug!(
            "getDockerInfo for node [{}] dockerInfo [{}]",
            node.name, host.facts.docker_root_dir
        );

        let mut plans = self.generate(&config, &host).await?;
        let token = self.token(cluster).await?;
        let generated = take_plan(&mut plans, &host.node_config.address)?;

        let processes = self
            .services
            .augmenter
            .augment(
                &token,
                generated.processes,
                false,
                &host.node_config.hostname_override,
                cluster,
            )
            .await
            .map_err(|source| PlanError::Augmentation {
                node: node.name.clone(),
                source,
            })?;
        let processes = self
            .services
            .augmenter
            .inject_taints(processes, &host.node_config.taints);

        Ok(NodePlan::from_processes(processes))
    }

    /// Builds the plan for a worker node.
    ///
    /// Windows hosts get the credential-free rewrite. On every host the
    /// restore marker is then written or carried forward, taints are
    /// injected, and the engine's file list is kept unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if host facts, configuration, generation, the
    /// cluster token or credential augmentation fail, or if the engine
    /// produced no plan for the node's address.
    pub async fn worker_plan(&self, node: &Node, cluster: &Cluster) -> Result<NodePlan> {
        let host = self.host(node).await?;

        let config = self.assemble(cluster).await?;
        let config = self.services.assembler.filter_for_node(config, node);
        debug!("[workerplan] The number of nodes sent to the plan: {}", config.nodes.len());

        let mut plans = self.generate(&config, &host).await?;
        debug!(
            "[workerplan] getDockerInfo for node [{}] dockerInfo [{}]",
            node.name, host.facts.docker_root_dir
        );

        let token = self.token(cluster).await?;
        let generated = take_plan(&mut plans, &host.node_config.address)?;

        let processes = if host.facts.is_windows() {
            self.services.augmenter.augment_windows(generated.processes)
        } else {
            self.services
                .augmenter
                .augment(
                    &token,
                    generated.processes,
                    true,
                    &host.node_config.hostname_override,
                    cluster,
                )
                .await
                .map_err(|source| PlanError::Augmentation {
                    node: node.name.clone(),
                    source,
                })?
        };

        let processes = apply_restore_marker(processes, node, cluster);
        let processes = self
            .services
            .augmenter
            .inject_taints(processes, &host.node_config.taints);

        Ok(NodePlan {
            processes,
            files: generated.files,
        })
    }

    async fn assemble(&self, cluster: &Cluster) -> Result<ClusterConfig> {
        let config = self
            .services
            .assembler
            .assemble(cluster, &cluster.status.applied_spec)
            .await
            .map_err(|e| PlanError::generation("failed to assemble cluster configuration", e))?;
        Ok(config)
    }

    async fn host<'n>(&self, node: &'n Node) -> Result<NodeHost<'n>> {
        let node_config = node_config(node)?;
        let by_address = self
            .services
            .hosts
            .host_facts(node)
            .await
            .map_err(|e| PlanError::lookup_failed(&node.name, e))?;

        let facts = by_address.get(&node_config.address).cloned().ok_or_else(|| {
            PlanError::lookup(
                &node.name,
                format!("no host facts for address {}", node_config.address),
            )
        })?;

        Ok(NodeHost {
            node_config,
            facts,
            by_address,
        })
    }

    async fn generate(&self, config: &ClusterConfig, host: &NodeHost<'_>) -> Result<GeneratedPlans> {
        let options =
            resolve_service_options(self.services.options, &config.version, &host.facts.os_type)
                .await?;

        let plans = self
            .services
            .generator
            .generate(config, &host.by_address, &options)
            .await
            .map_err(|e| PlanError::generation("plan generation failed", e))?;
        Ok(plans)
    }

    async fn token(&self, cluster: &Cluster) -> Result<String> {
        let token = self
            .services
            .tokens
            .cluster_token(&cluster.name)
            .await
            .map_err(|source| PlanError::Token {
                cluster: cluster.name.clone(),
                source,
            })?;
        Ok(token)
    }
}

fn node_config(node: &Node) -> Result<&NodeConfig> {
    let config = node
        .status
        .node_config
        .as_ref()
        .ok_or_else(|| PlanError::lookup(&node.name, "node has no recorded configuration"))?;
    Ok(config)
}

fn take_plan(plans: &mut GeneratedPlans, address: &str) -> Result<NodePlan> {
    let plan = plans.remove(address).ok_or_else(|| PlanError::NotFound {
        address: address.to_string(),
    })?;
    Ok(plan)
}

/// Writes or carries forward the restore marker on the kubelet process.
///
/// During a restore the marker is set to the cluster's node version so the
/// kubelet plan differs from whatever ran before. Outside a restore, a marker
/// from the node's applied plan is kept as-is: dropping it would be a plan
/// change that currently does not trigger a kubelet redeploy.
///
/// A plan without a `kubelet` process is returned untouched. No empty
/// kubelet entry is created to hold the marker, so the process count of the
/// generated plan never changes here.
#[must_use]
pub fn apply_restore_marker(mut processes: Processes, node: &Node, cluster: &Cluster) -> Processes {
    let marker = if cluster.restore_in_progress() {
        let marker = format!("{RESTORE_ENV_KEY}={}", cluster.status.node_version);
        debug!("[workerplan] adding/updating env var [{marker}] on node [{}]", node.name);
        Some(marker)
    } else {
        node.applied_plan()
            .and_then(|plan| plan.process(KUBELET_PROCESS))
            .and_then(|kubelet| kubelet.env.iter().find(|env| env_key(env) == RESTORE_ENV_KEY))
            .cloned()
    };

    if let Some(marker) = marker
        && let Some(kubelet) = processes.remove(KUBELET_PROCESS)
    {
        processes.insert(KUBELET_PROCESS.to_string(), upsert_env_var(kubelet, &marker));
    }
    processes
}
