//! Per-OS service options bundle handed to the plan generation engine.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::error;

use crate::error::{PlanError, Result};
use crate::services::{OsKind, VersionOptionsResolver};

/// Key under which Linux service options are passed.
pub const LINUX_OPTIONS_KEY: &str = "k8s-service-options";

/// Key under which Windows service options are passed.
pub const WINDOWS_OPTIONS_KEY: &str = "k8s-windows-service-options";

/// Service options keyed by option set name.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ServiceOptions(BTreeMap<String, serde_json::Value>);

impl ServiceOptions {
    /// Returns the option set stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Returns true if no option sets are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Stores an option set unless it is empty.
    fn insert_non_empty(&mut self, key: &str, options: Option<serde_json::Value>) {
        match options {
            None | Some(serde_json::Value::Null) => {}
            Some(serde_json::Value::Object(map)) if map.is_empty() => {}
            Some(value) => {
                self.0.insert(key.to_string(), value);
            }
        }
    }
}

/// Resolves the service options for a Kubernetes version and host OS type.
///
/// Linux options are always looked up. Windows options are added when
/// `os_type` is `"windows"`.
///
/// # Errors
///
/// Returns a generation error if the resolver fails.
pub async fn resolve_service_options(
    resolver: &dyn VersionOptionsResolver,
    k8s_version: &str,
    os_type: &str,
) -> Result<ServiceOptions> {
    let mut options = ServiceOptions::default();

    let linux = resolver
        .resolve(k8s_version, OsKind::Linux)
        .await
        .map_err(|e| {
            error!("getK8sServiceOptions: k8sVersion {k8s_version} [{e}]");
            PlanError::generation(format!("service options for {k8s_version}"), e)
        })?;
    options.insert_non_empty(LINUX_OPTIONS_KEY, linux);

    if os_type == crate::services::WINDOWS_OS_TYPE {
        let windows = resolver
            .resolve(k8s_version, OsKind::Windows)
            .await
            .map_err(|e| {
                error!("getK8sServiceOptionsWindows: k8sVersion {k8s_version} [{e}]");
                PlanError::generation(format!("windows service options for {k8s_version}"), e)
            })?;
        options.insert_non_empty(WINDOWS_OPTIONS_KEY, windows);
    }

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UpgraderError;
    use crate::services::MockVersionOptionsResolver;
    use serde_json::json;

    #[tokio::test]
    async fn test_linux_only() {
        let mut resolver = MockVersionOptionsResolver::new();
        resolver
            .expect_resolve()
            .withf(|version, os| version == "v1.27.8-rancher2-1" && *os == OsKind::Linux)
            .times(1)
            .returning(|_, _| Ok(Some(json!({"kubelet": {"v": "2"}}))));

        let options = resolve_service_options(&resolver, "v1.27.8-rancher2-1", "linux")
            .await
            .expect("options resolve");

        assert!(options.get(LINUX_OPTIONS_KEY).is_some());
        assert!(options.get(WINDOWS_OPTIONS_KEY).is_none());
    }

    #[tokio::test]
    async fn test_windows_adds_second_set() {
        let mut resolver = MockVersionOptionsResolver::new();
        resolver
            .expect_resolve()
            .times(2)
            .returning(|_, os| Ok(Some(json!({ "os": os.to_string() }))));

        let options = resolve_service_options(&resolver, "v1.27.8", "windows")
            .await
            .expect("options resolve");

        assert_eq!(options.get(LINUX_OPTIONS_KEY), Some(&json!({"os": "linux"})));
        assert_eq!(options.get(WINDOWS_OPTIONS_KEY), Some(&json!({"os": "windows"})));
    }

    #[tokio::test]
    async fn test_empty_options_skipped() {
        let mut resolver = MockVersionOptionsResolver::new();
        resolver.expect_resolve().returning(|_, _| Ok(None));

        let options = resolve_service_options(&resolver, "v1.27.8", "linux")
            .await
            .expect("options resolve");

        assert!(options.is_empty());
    }

    #[tokio::test]
    async fn test_resolver_error_propagates() {
        let mut resolver = MockVersionOptionsResolver::new();
        resolver
            .expect_resolve()
            .returning(|_, _| Err("metadata not synced".into()));

        let err = resolve_service_options(&resolver, "v1.27.8", "windows")
            .await
            .expect_err("resolver failure surfaces");

        assert!(matches!(err, UpgraderError::Plan(PlanError::Generation { .. })));
    }
}
