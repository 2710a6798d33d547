//! Planning module for node upgrades.
//!
//! This module builds a node's desired plan and compares it against the plan
//! the node last applied, deciding whether the difference needs a redeploy.

mod builder;
mod compare;
mod diff;
mod env;
mod options;
mod plan;

pub use builder::{PlanBuilder, PlanServices, RESTORE_ENV_KEY, apply_restore_marker};
pub use compare::{ProcessChange, ProcessField, diff_process, process_changed};
pub use diff::{
    PlanChange, PlanDecision, classify, update_only_change, update_only_required, upgrade_change,
    upgrade_required,
};
pub use env::upsert_env_var;
pub use options::{
    LINUX_OPTIONS_KEY, ServiceOptions, WINDOWS_OPTIONS_KEY, resolve_service_options,
};
pub use plan::{
    File, HealthCheck, KUBELET_PROCESS, NodePlan, Process, SHARE_MNT_MARKER, env_key, is_share_mnt,
};
