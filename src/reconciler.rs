//! Upgrade evaluation for a single node.
//!
//! This module ties the plan builder and the change detector together: it
//! builds the desired plan for a node through the path matching the node's
//! roles, compares it with the plan the node last applied, and reports what
//! the caller should do with it. Pushing the plan is left to the caller.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{Cluster, Node, PlanHasher};
use crate::error::Result;
use crate::planner::{NodePlan, PlanBuilder, PlanDecision, classify};

/// Evaluates whether a node needs its plan pushed.
pub struct UpgradeEvaluator<'a> {
    /// Plan builder.
    builder: PlanBuilder<'a>,
    /// Plan fingerprinting.
    hasher: PlanHasher,
}

/// Path used to build a node's plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlanPath {
    /// Worker-only nodes.
    Worker,
    /// Nodes serving etcd or control-plane roles.
    ControlPlane,
}

/// Result of evaluating one node.
#[derive(Debug, Serialize)]
pub struct NodeEvaluation {
    /// Node name.
    pub node: String,
    /// Path used to build the plan.
    pub path: PlanPath,
    /// What to do with the new plan.
    pub decision: PlanDecision,
    /// Fingerprint of the applied plan, if any.
    pub old_hash: Option<String>,
    /// Fingerprint of the new plan.
    pub new_hash: String,
    /// When the evaluation ran.
    pub evaluated_at: DateTime<Utc>,
    /// The newly built plan.
    #[serde(skip)]
    pub plan: NodePlan,
}

impl<'a> UpgradeEvaluator<'a> {
    /// Creates a new evaluator.
    #[must_use]
    pub const fn new(builder: PlanBuilder<'a>) -> Self {
        Self {
            builder,
            hasher: PlanHasher::new(),
        }
    }

    /// Selects the build path for a node from its recorded roles.
    #[must_use]
    pub fn path_for(node: &Node) -> PlanPath {
        if node.is_worker_only() {
            PlanPath::Worker
        } else {
            PlanPath::ControlPlane
        }
    }

    /// Builds the node's plan and classifies it against the applied plan.
    ///
    /// # Errors
    ///
    /// Returns any error from building the plan, unchanged.
    pub async fn evaluate(&self, node: &Node, cluster: &Cluster) -> Result<NodeEvaluation> {
        let path = Self::path_for(node);
        debug!("Evaluating node {} via {:?} path", node.name, path);

        let plan = match path {
            PlanPath::Worker => self.builder.worker_plan(node, cluster).await?,
            PlanPath::ControlPlane => self.builder.control_plane_plan(node, cluster).await?,
        };

        let applied = node.applied_plan();
        let decision = classify(Some(&plan), applied);
        let new_hash = self.hasher.hash_plan(&plan);
        let old_hash = applied.map(|p| self.hasher.hash_plan(p));

        info!(
            "Node {}: {} (plan {})",
            node.name,
            decision,
            self.hasher.short_hash(&new_hash)
        );

        Ok(NodeEvaluation {
            node: node.name.clone(),
            path,
            decision,
            old_hash,
            new_hash,
            evaluated_at: Utc::now(),
            plan,
        })
    }
}

impl NodeEvaluation {
    /// Returns true if the caller should push the new plan to the node.
    #[must_use]
    pub const fn needs_push(&self) -> bool {
        !matches!(self.decision, PlanDecision::NoChange)
    }
}

impl std::fmt::Display for NodeEvaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Node {}:", self.node)?;
        writeln!(f, "  Decision: {}", self.decision)?;
        writeln!(f, "  New plan: {}", self.new_hash)?;
        if let Some(old) = &self.old_hash {
            writeln!(f, "  Applied plan: {old}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppliedNodePlan, NodeConfig, NodeRole, NodeStatus};
    use crate::planner::{PlanServices, Process};
    use crate::services::{
        HostFacts, MockConfigAssembler, MockHostInspector, MockPlanGenerator,
        MockProcessAugmenter, MockTokenService, MockVersionOptionsResolver,
    };
    use std::collections::BTreeMap;

    const ADDRESS: &str = "172.16.0.4";

    fn engine_plan(image: &str) -> NodePlan {
        let kubelet = Process::new("kubelet", image);
        NodePlan::from_processes(BTreeMap::from([(String::from("kubelet"), kubelet)]))
    }

    fn node(roles: Vec<NodeRole>, applied: Option<NodePlan>) -> Node {
        Node {
            name: String::from("node-a"),
            status: NodeStatus {
                node_config: Some(NodeConfig {
                    address: String::from(ADDRESS),
                    role: roles,
                    ..NodeConfig::default()
                }),
                node_plan: applied.map(|plan| AppliedNodePlan {
                    plan: Some(plan),
                    version: 1,
                }),
                ..NodeStatus::default()
            },
        }
    }

    struct Mocks {
        generator: MockPlanGenerator,
        hosts: MockHostInspector,
        augmenter: MockProcessAugmenter,
        assembler: MockConfigAssembler,
        tokens: MockTokenService,
        options: MockVersionOptionsResolver,
    }

    fn mocks(image: &'static str, expect_worker: bool) -> Mocks {
        let mut hosts = MockHostInspector::new();
        hosts.expect_host_facts().returning(|_| {
            Ok(BTreeMap::from([(String::from(ADDRESS), HostFacts::default())]))
        });
        let mut assembler = MockConfigAssembler::new();
        assembler
            .expect_assemble()
            .returning(|_, _| Ok(crate::config::ClusterConfig::default()));
        assembler.expect_filter_for_node().returning(|config, _| config);
        let mut options = MockVersionOptionsResolver::new();
        options.expect_resolve().returning(|_, _| Ok(None));
        let mut generator = MockPlanGenerator::new();
        generator
            .expect_generate()
            .returning(move |_, _, _| Ok(BTreeMap::from([(String::from(ADDRESS), engine_plan(image))])));
        let mut tokens = MockTokenService::new();
        tokens.expect_cluster_token().returning(|_| Ok(String::from("t")));
        let mut augmenter = MockProcessAugmenter::new();
        augmenter
            .expect_augment()
            .withf(move |_, _, is_worker, _, _| *is_worker == expect_worker)
            .times(1)
            .returning(|_, processes, _, _, _| Ok(processes));
        augmenter.expect_inject_taints().returning(|p, _| p);

        Mocks {
            generator,
            hosts,
            augmenter,
            assembler,
            tokens,
            options,
        }
    }

    impl Mocks {
        fn builder(&self) -> PlanBuilder<'_> {
            PlanBuilder::new(PlanServices {
                generator: &self.generator,
                hosts: &self.hosts,
                augmenter: &self.augmenter,
                assembler: &self.assembler,
                tokens: &self.tokens,
                options: &self.options,
            })
        }
    }

    #[test]
    fn test_path_selection() {
        assert_eq!(
            UpgradeEvaluator::path_for(&node(vec![NodeRole::Worker], None)),
            PlanPath::Worker
        );
        assert_eq!(
            UpgradeEvaluator::path_for(&node(vec![NodeRole::Worker, NodeRole::ControlPlane], None)),
            PlanPath::ControlPlane
        );
    }

    #[tokio::test]
    async fn test_first_plan_needs_redeploy() {
        let mocks = mocks("rancher/hyperkube:v1.27.8", true);
        let evaluator = UpgradeEvaluator::new(mocks.builder());

        let evaluation = evaluator
            .evaluate(&node(vec![NodeRole::Worker], None), &Cluster::default())
            .await
            .expect("evaluation succeeds");

        assert_eq!(evaluation.decision, PlanDecision::Redeploy);
        assert!(evaluation.old_hash.is_none());
        assert!(evaluation.needs_push());
    }

    #[tokio::test]
    async fn test_unchanged_plan() {
        let image = "rancher/hyperkube:v1.27.8";
        let mocks = mocks(image, true);
        let evaluator = UpgradeEvaluator::new(mocks.builder());

        let evaluation = evaluator
            .evaluate(
                &node(vec![NodeRole::Worker], Some(engine_plan(image))),
                &Cluster::default(),
            )
            .await
            .expect("evaluation succeeds");

        assert_eq!(evaluation.decision, PlanDecision::NoChange);
        assert_eq!(evaluation.old_hash.as_deref(), Some(evaluation.new_hash.as_str()));
        assert!(!evaluation.needs_push());
    }

    #[tokio::test]
    async fn test_control_plane_image_bump() {
        let mocks = mocks("rancher/hyperkube:v1.28.1", false);
        let evaluator = UpgradeEvaluator::new(mocks.builder());

        let evaluation = evaluator
            .evaluate(
                &node(vec![NodeRole::Etcd], Some(engine_plan("rancher/hyperkube:v1.27.8"))),
                &Cluster::default(),
            )
            .await
            .expect("evaluation succeeds");

        assert_eq!(evaluation.path, PlanPath::ControlPlane);
        assert_eq!(evaluation.decision, PlanDecision::Redeploy);
    }
}
