//! Plan-level change detection.
//!
//! Two policies with different sensitivity compare a freshly built node plan
//! against the last applied one:
//!
//! - [`upgrade_required`]: the process set changed in a way that needs the
//!   node's containers redeployed. share-mnt helpers are ignored.
//! - [`update_only_required`]: something changed that should be recorded
//!   without a redeploy (files, health check, restart policy, registry
//!   auth), plus any change to a share-mnt helper.
//!
//! [`classify`] folds both into a [`PlanDecision`].

use serde::Serialize;
use tracing::info;

use super::compare::{ProcessChange, diff_process};
use super::plan::{NodePlan, is_share_mnt};

/// Outcome of comparing a new node plan with the applied one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlanDecision {
    /// The node must be redeployed with the new plan.
    Redeploy,
    /// The new plan must be recorded, without a redeploy.
    UpdateOnly,
    /// Nothing to do.
    NoChange,
}

/// Reason a plan comparison reported a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanChange {
    /// One of the plans has not been applied yet.
    NotApplied,
    /// The number of processes differs.
    ProcessCount {
        /// Process count of the old plan.
        old: usize,
        /// Process count of the new plan.
        new: usize,
    },
    /// A process in the new plan has no counterpart in the old plan.
    MissingProcess(String),
    /// A process changed in a redeploy-sensitive field.
    Process(ProcessChange),
    /// The file list differs.
    Files,
    /// A process changed in a field that does not restart its container.
    Metadata {
        /// Process name.
        process: String,
        /// Field that changed.
        field: &'static str,
    },
}

/// Returns true if the node must be redeployed to move from `old_plan` to `new_plan`.
///
/// A missing plan on either side always counts as a change.
#[must_use]
pub fn upgrade_required(new_plan: Option<&NodePlan>, old_plan: Option<&NodePlan>) -> bool {
    report("upgrade", upgrade_change(new_plan, old_plan))
}

/// Returns true if the new plan must be recorded even though no redeploy is needed.
///
/// Only processes present in both plans are compared.
#[must_use]
pub fn update_only_required(new_plan: Option<&NodePlan>, old_plan: Option<&NodePlan>) -> bool {
    report("update", update_only_change(new_plan, old_plan))
}

/// Classifies the delta between two plans.
#[must_use]
pub fn classify(new_plan: Option<&NodePlan>, old_plan: Option<&NodePlan>) -> PlanDecision {
    if upgrade_required(new_plan, old_plan) {
        PlanDecision::Redeploy
    } else if update_only_required(new_plan, old_plan) {
        PlanDecision::UpdateOnly
    } else {
        PlanDecision::NoChange
    }
}

/// Finds the first change that requires a redeploy.
#[must_use]
pub fn upgrade_change(new_plan: Option<&NodePlan>, old_plan: Option<&NodePlan>) -> Option<PlanChange> {
    let (Some(new_plan), Some(old_plan)) = (new_plan, old_plan) else {
        return Some(PlanChange::NotApplied);
    };

    if new_plan.processes.len() != old_plan.processes.len() {
        return Some(PlanChange::ProcessCount {
            old: old_plan.processes.len(),
            new: new_plan.processes.len(),
        });
    }

    for (name, new_process) in &new_plan.processes {
        if is_share_mnt(name) {
            continue;
        }
        let Some(old_process) = old_plan.processes.get(name) else {
            return Some(PlanChange::MissingProcess(name.clone()));
        };
        if let Some(change) = diff_process(old_process, new_process) {
            return Some(PlanChange::Process(change));
        }
    }

    None
}

/// Finds the first change that should be recorded without a redeploy.
#[must_use]
pub fn update_only_change(
    new_plan: Option<&NodePlan>,
    old_plan: Option<&NodePlan>,
) -> Option<PlanChange> {
    let (Some(new_plan), Some(old_plan)) = (new_plan, old_plan) else {
        return Some(PlanChange::NotApplied);
    };

    if new_plan.files != old_plan.files {
        return Some(PlanChange::Files);
    }

    // Processes only present on one side are not considered here.
    for (name, new_process) in &new_plan.processes {
        let Some(old_process) = old_plan.processes.get(name) else {
            continue;
        };

        let metadata = [
            ("name", old_process.name != new_process.name),
            ("healthCheck.url", old_process.health_check.url != new_process.health_check.url),
            ("restartPolicy", old_process.restart_policy != new_process.restart_policy),
            (
                "imageRegistryAuthConfig",
                old_process.image_registry_auth_config != new_process.image_registry_auth_config,
            ),
        ];
        if let Some((field, _)) = metadata.into_iter().find(|(_, changed)| *changed) {
            return Some(PlanChange::Metadata {
                process: name.clone(),
                field,
            });
        }

        if is_share_mnt(name)
            && let Some(change) = diff_process(old_process, new_process)
        {
            return Some(PlanChange::Process(change));
        }
    }

    None
}

/// Single emission point for plan comparison results.
fn report(policy: &'static str, change: Option<PlanChange>) -> bool {
    match change {
        Some(change) => {
            info!(policy, reason = %change, "node plan changed");
            true
        }
        None => false,
    }
}

impl std::fmt::Display for PlanDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Redeploy => "redeploy",
            Self::UpdateOnly => "update-only",
            Self::NoChange => "no change",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for PlanChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotApplied => write!(f, "plan not yet applied"),
            Self::ProcessCount { old, new } => {
                write!(f, "number of processes changed: old: {old} new: {new}")
            }
            Self::MissingProcess(name) => write!(f, "process [{name}] missing from old plan"),
            Self::Process(change) => write!(f, "{change}"),
            Self::Files => write!(f, "files changed"),
            Self::Metadata { process, field } => write!(f, "{field} changed for [{process}]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::compare::ProcessField;
    use crate::planner::plan::{File, Process};

    fn process(name: &str, image: &str) -> Process {
        let mut process = Process::new(name, image);
        process.env = vec![String::from("A=1")];
        process.restart_policy = String::from("always");
        process
    }

    fn plan(processes: Vec<Process>) -> NodePlan {
        NodePlan::from_processes(
            processes
                .into_iter()
                .map(|p| (p.name.clone(), p))
                .collect(),
        )
    }

    fn worker_plan() -> NodePlan {
        plan(vec![
            process("kubelet", "rancher/hyperkube:v1.27.8"),
            process("kube-proxy", "rancher/hyperkube:v1.27.8"),
            process("share-mnt", "rancher/rke-tools:v0.1.96"),
        ])
    }

    #[test]
    fn test_upgrade_not_required_for_same_plan() {
        let plan = worker_plan();
        assert!(!upgrade_required(Some(&plan), Some(&plan)));
        assert_eq!(classify(Some(&plan), Some(&plan)), PlanDecision::NoChange);
    }

    #[test]
    fn test_missing_plan_is_change() {
        let plan = worker_plan();
        assert!(upgrade_required(None, Some(&plan)));
        assert!(upgrade_required(Some(&plan), None));
        assert!(update_only_required(Some(&plan), None));
        assert_eq!(upgrade_change(None, None), Some(PlanChange::NotApplied));
    }

    #[test]
    fn test_process_count_change() {
        let old = worker_plan();
        let mut new = worker_plan();
        new.processes.insert(String::from("nginx-proxy"), process("nginx-proxy", "rancher/rke-tools"));

        assert_eq!(
            upgrade_change(Some(&new), Some(&old)),
            Some(PlanChange::ProcessCount { old: 3, new: 4 })
        );
    }

    #[test]
    fn test_renamed_process_is_missing() {
        let old = worker_plan();
        let mut new = worker_plan();
        let proxy = new.processes.remove("kube-proxy").expect("kube-proxy present");
        new.processes.insert(String::from("kube-proxy-v2"), proxy);

        assert_eq!(
            upgrade_change(Some(&new), Some(&old)),
            Some(PlanChange::MissingProcess(String::from("kube-proxy-v2")))
        );
    }

    #[test]
    fn test_kubelet_image_change_requires_redeploy() {
        let old = worker_plan();
        let mut new = worker_plan();
        if let Some(kubelet) = new.processes.get_mut("kubelet") {
            kubelet.image = String::from("rancher/hyperkube:v1.28.1");
        }

        match upgrade_change(Some(&new), Some(&old)) {
            Some(PlanChange::Process(change)) => {
                assert_eq!(change.process, "kubelet");
                assert_eq!(change.field, ProcessField::Image);
            }
            other => panic!("unexpected change: {other:?}"),
        }
        assert_eq!(classify(Some(&new), Some(&old)), PlanDecision::Redeploy);
    }

    #[test]
    fn test_share_mnt_change_is_update_only() {
        let old = worker_plan();
        let mut new = worker_plan();
        if let Some(share_mnt) = new.processes.get_mut("share-mnt") {
            share_mnt.image = String::from("rancher/rke-tools:v0.1.97");
        }

        assert!(!upgrade_required(Some(&new), Some(&old)));
        assert!(update_only_required(Some(&new), Some(&old)));
        assert_eq!(classify(Some(&new), Some(&old)), PlanDecision::UpdateOnly);
    }

    #[test]
    fn test_renamed_share_mnt_does_not_require_upgrade() {
        let old = worker_plan();
        let mut new = worker_plan();
        let share_mnt = new.processes.remove("share-mnt").expect("share-mnt present");
        new.processes.insert(String::from("share-mnt-v2"), share_mnt);

        assert!(!upgrade_required(Some(&new), Some(&old)));
    }

    #[test]
    fn test_update_only_fields() {
        let old = worker_plan();

        let mut new = worker_plan();
        if let Some(proxy) = new.processes.get_mut("kube-proxy") {
            proxy.health_check.url = String::from("http://localhost:10256/healthz");
        }
        assert!(!upgrade_required(Some(&new), Some(&old)));
        assert_eq!(
            update_only_change(Some(&new), Some(&old)),
            Some(PlanChange::Metadata {
                process: String::from("kube-proxy"),
                field: "healthCheck.url",
            })
        );

        let mut new = worker_plan();
        if let Some(kubelet) = new.processes.get_mut("kubelet") {
            kubelet.restart_policy = String::from("unless-stopped");
        }
        assert!(update_only_required(Some(&new), Some(&old)));

        let mut new = worker_plan();
        if let Some(kubelet) = new.processes.get_mut("kubelet") {
            kubelet.image_registry_auth_config = String::from("registry-secret");
        }
        assert!(update_only_required(Some(&new), Some(&old)));
    }

    #[test]
    fn test_name_field_mismatch_is_update_only() {
        let old = worker_plan();
        let mut new = worker_plan();
        if let Some(kubelet) = new.processes.get_mut("kubelet") {
            kubelet.name = String::from("kubelet-renamed");
        }

        assert_eq!(
            update_only_change(Some(&new), Some(&old)),
            Some(PlanChange::Metadata {
                process: String::from("kubelet"),
                field: "name",
            })
        );
    }

    #[test]
    fn test_files_change_is_update_only() {
        let old = worker_plan();
        let mut new = worker_plan();
        new.files.push(File {
            name: String::from("/etc/kubernetes/audit-policy.yaml"),
            contents: String::from("apiVersion: audit.k8s.io/v1"),
        });

        assert!(!upgrade_required(Some(&new), Some(&old)));
        assert_eq!(update_only_change(Some(&new), Some(&old)), Some(PlanChange::Files));
    }

    #[test]
    fn test_update_only_ignores_added_and_removed_processes() {
        let old = worker_plan();
        let mut new = worker_plan();
        new.processes.remove("kube-proxy");
        new.processes.insert(String::from("nginx-proxy"), process("nginx-proxy", "rancher/rke-tools"));

        assert!(!update_only_required(Some(&new), Some(&old)));
        assert!(upgrade_required(Some(&new), Some(&old)));
    }
}
