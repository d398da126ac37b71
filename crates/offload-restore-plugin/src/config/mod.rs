//! The kubemover configuration read from the plugin config record.
use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{ResourceRequirements, SecurityContext};
use snafu::{ResultExt, Snafu};
use tracing::debug;

use crate::constants::{config_keys, defaults};

pub mod resolver;
pub mod validation;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum Error {
    #[snafu(display("invalid resource requirements in plugin config"))]
    InvalidResources { source: validation::Error },

    #[snafu(display("invalid security context in plugin config"))]
    InvalidSecurityContext { source: validation::Error },
}

/// The validated kubemover configuration.
///
/// It can only be constructed through [`PluginConfig::from_data`], which validates every
/// numeric and boolean field, so a `PluginConfig` never carries values that would fail later.
#[derive(Clone, Debug, PartialEq)]
pub struct PluginConfig {
    pub cluster_id: String,
    pub pod_name_prefix: String,
    pub image: String,
    pub server_addr: String,

    /// Passed verbatim to kubemover's `--tls` flag.
    pub use_tls: String,

    resources: ResourceRequirements,
    security_context: SecurityContext,
}

impl PluginConfig {
    /// Builds the configuration from the data of a plugin config record.
    ///
    /// Missing or empty resource keys fall back to [`defaults`]. Missing string keys are
    /// treated as empty strings, and an empty security context value leaves that field unset.
    pub fn from_data(data: &BTreeMap<String, String>) -> Result<Self> {
        let get = |key: &str| data.get(key).map(String::as_str).unwrap_or_default();
        let get_or_default = |key: &str, default: &'static str| match get(key) {
            "" => {
                debug!(key, default, "applying default for unset plugin config key");
                default
            }
            value => value,
        };

        let resources = validation::parse_resource_requirements(
            get_or_default(config_keys::CPU_REQUEST, defaults::CPU_REQUEST),
            get_or_default(config_keys::MEM_REQUEST, defaults::MEM_REQUEST),
            get_or_default(config_keys::CPU_LIMIT, defaults::CPU_LIMIT),
            get_or_default(config_keys::MEM_LIMIT, defaults::MEM_LIMIT),
        )
        .context(InvalidResourcesSnafu)?;

        let security_context = validation::parse_security_context(
            get(config_keys::RUN_AS_USER),
            get(config_keys::RUN_AS_GROUP),
            get(config_keys::ALLOW_PRIVILEGE_ESCALATION),
        )
        .context(InvalidSecurityContextSnafu)?;

        Ok(Self {
            cluster_id: get(config_keys::CLUSTER_ID).to_owned(),
            pod_name_prefix: get(config_keys::POD_NAME_PREFIX).to_owned(),
            image: get(config_keys::IMAGE).to_owned(),
            server_addr: get(config_keys::SERVER_ADDR).to_owned(),
            use_tls: get(config_keys::USE_TLS).to_owned(),
            resources,
            security_context,
        })
    }

    /// The configuration used when no plugin config record exists: only the resource defaults
    /// are set.
    pub fn default_only() -> Result<Self> {
        Self::from_data(&BTreeMap::new())
    }

    pub fn resources(&self) -> &ResourceRequirements {
        &self.resources
    }

    pub fn security_context(&self) -> &SecurityContext {
        &self.security_context
    }
}

#[cfg(test)]
mod tests {
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity as K8sQuantity;

    use super::*;

    fn data(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn from_full_data() {
        let config = PluginConfig::from_data(&data(&[
            ("clusterID", "c-42"),
            ("kubeMoverPodNamePrefix", "kubemover-"),
            ("kubeMoverImage", "registry.example.com/kubemover:2.1"),
            ("serverAddr", "mover.example.com:443"),
            ("useTLS", "true"),
            ("cpuRequest", "250m"),
            ("cpuLimit", "1"),
            ("memRequest", "64Mi"),
            ("memLimit", "256Mi"),
            ("runAsRoot", "0"),
            ("runAsGroup", "0"),
            ("allowPrivilegeEscalation", "false"),
        ]))
        .expect("complete config must be valid");

        assert_eq!(config.cluster_id, "c-42");
        assert_eq!(config.pod_name_prefix, "kubemover-");
        assert_eq!(config.image, "registry.example.com/kubemover:2.1");
        assert_eq!(config.server_addr, "mover.example.com:443");
        assert_eq!(config.use_tls, "true");

        let requests = config.resources().requests.as_ref().expect("requests");
        assert_eq!(requests.get("cpu"), Some(&K8sQuantity("250m".to_owned())));
        assert_eq!(requests.get("memory"), Some(&K8sQuantity("64Mi".to_owned())));
        let limits = config.resources().limits.as_ref().expect("limits");
        assert_eq!(limits.get("cpu"), Some(&K8sQuantity("1".to_owned())));
        assert_eq!(limits.get("memory"), Some(&K8sQuantity("256Mi".to_owned())));

        assert_eq!(config.security_context().run_as_user, Some(0));
        assert_eq!(config.security_context().run_as_group, Some(0));
        assert_eq!(
            config.security_context().allow_privilege_escalation,
            Some(false)
        );
    }

    #[test]
    fn default_only_applies_resource_defaults() {
        let config = PluginConfig::default_only().expect("defaults must be valid");

        assert_eq!(config.image, "");
        assert_eq!(config.security_context(), &SecurityContext::default());

        let requests = config.resources().requests.as_ref().expect("requests");
        assert_eq!(requests.get("cpu"), Some(&K8sQuantity("100m".to_owned())));
        assert_eq!(requests.get("memory"), Some(&K8sQuantity("100m".to_owned())));
        let limits = config.resources().limits.as_ref().expect("limits");
        assert_eq!(limits.get("cpu"), Some(&K8sQuantity("128Mi".to_owned())));
        assert_eq!(limits.get("memory"), Some(&K8sQuantity("128Mi".to_owned())));
    }

    #[test]
    fn empty_values_fall_back_to_defaults() {
        let config = PluginConfig::from_data(&data(&[("cpuRequest", ""), ("memLimit", "1Gi")]))
            .expect("config must be valid");

        let requests = config.resources().requests.as_ref().expect("requests");
        assert_eq!(requests.get("cpu"), Some(&K8sQuantity("100m".to_owned())));
        let limits = config.resources().limits.as_ref().expect("limits");
        assert_eq!(limits.get("memory"), Some(&K8sQuantity("1Gi".to_owned())));
    }

    #[test]
    fn invalid_values_are_rejected_at_construction() {
        assert!(matches!(
            PluginConfig::from_data(&data(&[("cpuRequest", "2"), ("cpuLimit", "1")])),
            Err(Error::InvalidResources { .. })
        ));
        assert!(matches!(
            PluginConfig::from_data(&data(&[("runAsGroup", "wheel")])),
            Err(Error::InvalidSecurityContext { .. })
        ));
    }
}
