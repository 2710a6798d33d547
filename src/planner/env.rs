//! Idempotent `KEY=VALUE` upsert into a process environment.

use super::plan::{Process, env_key};

/// Adds or overwrites an environment entry on a process.
///
/// Returns the process unchanged when its name or image is empty, or when
/// `new_var` is empty. An existing entry with the same key is replaced in
/// place; otherwise `new_var` is appended.
#[must_use]
pub fn upsert_env_var(mut process: Process, new_var: &str) -> Process {
    if process.name.is_empty() || process.image.is_empty() || new_var.is_empty() {
        return process;
    }

    let target_key = env_key(new_var);
    match process.env.iter().position(|env| env_key(env) == target_key) {
        Some(index) => process.env[index] = new_var.to_string(),
        None => process.env.push(new_var.to_string()),
    }
    process
}
