//! Node plan fingerprints.
//!
//! Fingerprints are for display and logging only. Redeploy decisions are
//! made by the change detector, never by comparing hashes.

use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

use crate::planner::{NodePlan, Process};

/// Hasher for computing node plan fingerprints.
#[derive(Debug, Default)]
pub struct PlanHasher;

impl PlanHasher {
    /// Creates a new plan hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes a hash of a whole node plan.
    #[must_use]
    pub fn hash_plan(&self, plan: &NodePlan) -> String {
        let mut hasher = Sha256::new();

        // Processes are visited in name order
        for (name, process) in &plan.processes {
            hasher.update(name.as_bytes());
            hasher.update(self.hash_process(process).as_bytes());
        }

        for file in &plan.files {
            hasher.update(file.name.as_bytes());
            hasher.update([0u8]);
            hasher.update(file.contents.as_bytes());
            hasher.update([0u8]);
        }

        hex::encode(hasher.finalize())
    }

    /// Computes a hash of a single process.
    ///
    /// Command, env and args are hashed as sorted sets so that reordering
    /// them does not change the fingerprint.
    #[must_use]
    pub fn hash_process(&self, process: &Process) -> String {
        let mut hasher = Sha256::new();

        update_field(&mut hasher, &process.name);
        update_field(&mut hasher, &process.image);

        for values in [&process.command, &process.env, &process.args] {
            let set: BTreeSet<&str> = values.iter().map(String::as_str).collect();
            update_list(&mut hasher, set);
        }

        for values in [&process.binds, &process.volumes_from, &process.publish] {
            update_list(&mut hasher, values.iter().map(String::as_str));
        }

        // Labels are stored sorted; an absent map hashes apart from an empty one
        match &process.labels {
            Some(labels) => {
                hasher.update([1u8]);
                for (key, value) in labels {
                    update_field(&mut hasher, key);
                    update_field(&mut hasher, value);
                }
            }
            None => hasher.update([0u8]),
        }
        hasher.update([1u8]);

        update_field(&mut hasher, &process.network_mode);
        update_field(&mut hasher, &process.pid_mode);
        hasher.update(if process.privileged { [1u8] } else { [0u8] });
        update_field(&mut hasher, &process.health_check.url);
        update_field(&mut hasher, &process.restart_policy);
        update_field(&mut hasher, &process.image_registry_auth_config);

        hex::encode(hasher.finalize())
    }

    /// Computes a short hash (first 8 characters) for display purposes.
    #[must_use]
    pub fn short_hash(&self, hash: &str) -> String {
        hash.chars().take(8).collect()
    }
}

fn update_field(hasher: &mut Sha256, value: &str) {
    hasher.update(value.as_bytes());
    hasher.update([0u8]);
}

fn update_list<'v>(hasher: &mut Sha256, values: impl IntoIterator<Item = &'v str>) {
    for value in values {
        update_field(hasher, value);
    }
    hasher.update([1u8]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn plan_with(process: Process) -> NodePlan {
        NodePlan::from_processes(BTreeMap::from([(process.name.clone(), process)]))
    }

    fn kube_proxy() -> Process {
        let mut process = Process::new("kube-proxy", "rancher/hyperkube:v1.27.8");
        process.env = vec![String::from("A=1"), String::from("B=2")];
        process.binds = vec![String::from("/a:/a"), String::from("/b:/b")];
        process
    }

    #[test]
    fn test_plan_hash_deterministic() {
        let hasher = PlanHasher::new();
        let plan = plan_with(kube_proxy());

        assert_eq!(hasher.hash_plan(&plan), hasher.hash_plan(&plan.clone()));
    }

    #[test]
    fn test_env_order_does_not_change_hash() {
        let hasher = PlanHasher::new();
        let mut reordered = kube_proxy();
        reordered.env.reverse();

        assert_eq!(
            hasher.hash_process(&kube_proxy()),
            hasher.hash_process(&reordered)
        );
    }

    #[test]
    fn test_bind_order_changes_hash() {
        let hasher = PlanHasher::new();
        let mut reordered = kube_proxy();
        reordered.binds.reverse();

        assert_ne!(
            hasher.hash_process(&kube_proxy()),
            hasher.hash_process(&reordered)
        );
    }

    #[test]
    fn test_field_boundaries() {
        let hasher = PlanHasher::new();
        let mut a = kube_proxy();
        a.env = vec![String::from("AB")];
        a.args = vec![];
        let mut b = kube_proxy();
        b.env = vec![String::from("A")];
        b.args = vec![String::from("B")];

        assert_ne!(hasher.hash_process(&a), hasher.hash_process(&b));
    }

    #[test]
    fn test_short_hash() {
        let hasher = PlanHasher::new();
        let short = hasher.short_hash("abcdef1234567890abcdef1234567890");

        assert_eq!(short, "abcdef12");
    }
}
