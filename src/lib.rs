// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![warn(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Node Upgrade Planner
//!
//! Builds the desired runtime plan for a cluster node and decides whether it
//! differs from the plan the node last applied.
//!
//! ## Overview
//!
//! A node plan is the set of container processes (kubelet, kube-proxy,
//! share-mnt helpers, ...) plus files a node agent runs. During an upgrade:
//!
//! - The desired plan is built through the worker or control-plane path
//! - It is compared with the applied plan under two policies
//! - A difference in runtime fields requires a redeploy
//! - A difference in metadata only requires an update-only push
//!
//! ## Modules
//!
//! - [`config`]: Cluster and node snapshots, snapshot loading, plan fingerprints
//! - [`services`]: Collaborator traits (plan engine, host inspection, tokens)
//! - [`planner`]: Plan building and change detection
//! - [`reconciler`]: Per-node upgrade evaluation
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```
//! use node_upgrade_planner::planner::{NodePlan, Process, PlanDecision, classify};
//!
//! let mut old = NodePlan::default();
//! old.processes.insert("kubelet".into(), Process::new("kubelet", "hyperkube:v1"));
//! let mut new = old.clone();
//! if let Some(kubelet) = new.processes.get_mut("kubelet") {
//!     kubelet.image = "hyperkube:v2".into();
//! }
//!
//! assert_eq!(classify(Some(&new), Some(&old)), PlanDecision::Redeploy);
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod error;
pub mod planner;
pub mod reconciler;
pub mod services;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{Cluster, Node, PlanHasher, SnapshotParser};
pub use error::{PlanError, Result, UpgraderError};
pub use planner::{NodePlan, PlanBuilder, PlanDecision, PlanServices, Process};
pub use reconciler::{NodeEvaluation, UpgradeEvaluator};
