//! Locates the plugin config record and turns it into a [`PluginConfig`].
use k8s_openapi::api::core::v1::ConfigMap;
use kube::ResourceExt;
use snafu::{ResultExt, Snafu, ensure};
use tracing::{debug, instrument, warn};

use crate::{
    client::{self, ConfigMapSource},
    config::{self as plugin_config, PluginConfig},
    kvp::PluginConfigSelector,
};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to list plugin config maps in namespace {namespace:?}"))]
    ListConfigMaps {
        source: client::Error,
        namespace: String,
    },

    #[snafu(display(
        "found more than one ConfigMap matching label selector {selector:?}: {config_maps:?}"
    ))]
    AmbiguousConfigMaps {
        selector: String,
        config_maps: Vec<String>,
    },

    #[snafu(display("plugin config {config_map:?} is invalid"))]
    InvalidConfig {
        source: plugin_config::Error,
        config_map: String,
    },
}

impl Error {
    /// Whether the record was found but its contents are invalid, as opposed to the lookup
    /// itself failing.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }
}

/// Resolves the [`PluginConfig`] of a plugin from the ConfigMaps returned by its source.
///
/// The source is handed in by the caller. Every call to [`ConfigResolver::resolve`] queries it
/// again, nothing is cached between restore items.
pub struct ConfigResolver<S> {
    source: S,
    namespace: String,
}

impl<S: ConfigMapSource> ConfigResolver<S> {
    pub fn new(source: S, namespace: impl Into<String>) -> Self {
        Self {
            source,
            namespace: namespace.into(),
        }
    }

    /// Returns the single ConfigMap matching `selector`, or `None` if there is none.
    ///
    /// More than one match is an error listing all candidates instead of picking one.
    #[instrument(skip(self), fields(namespace = %self.namespace))]
    pub async fn fetch_config_map(
        &self,
        selector: &PluginConfigSelector,
    ) -> Result<Option<ConfigMap>> {
        let mut config_maps = self
            .source
            .list_config_maps(&self.namespace, selector)
            .await
            .with_context(|_| ListConfigMapsSnafu {
                namespace: self.namespace.clone(),
            })?;

        ensure!(
            config_maps.len() <= 1,
            AmbiguousConfigMapsSnafu {
                selector: selector
                    .to_query_string()
                    .unwrap_or_else(|_| format!("{selector:?}")),
                config_maps: config_maps
                    .iter()
                    .map(ResourceExt::name_any)
                    .collect::<Vec<_>>(),
            }
        );

        Ok(config_maps.pop())
    }

    /// Fetches and validates the config of the restore item action `plugin_name`.
    ///
    /// A missing record is not an error: [`PluginConfig::default_only`] is returned instead.
    pub async fn resolve(&self, plugin_name: &str, kind: &str) -> Result<PluginConfig> {
        let selector = PluginConfigSelector::new(plugin_name, kind);

        let Some(config_map) = self.fetch_config_map(&selector).await? else {
            warn!(
                plugin_name,
                namespace = %self.namespace,
                "no plugin config found, using default configuration"
            );
            return PluginConfig::default_only().context(InvalidConfigSnafu {
                config_map: "<defaults>",
            });
        };

        let name = config_map.name_any();
        debug!(config_map = %name, "found plugin config");

        let data = config_map.data.unwrap_or_default();
        PluginConfig::from_data(&data).context(InvalidConfigSnafu { config_map: name })
    }
}
