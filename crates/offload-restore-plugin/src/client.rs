//! Access to the ConfigMaps holding the plugin config record.
//!
//! The resolver only needs to list ConfigMaps by label, which is captured by the
//! [`ConfigMapSource`] trait. [`Client`] implements it against a Kubernetes cluster,
//! [`StaticConfigMaps`] against a fixed list (offline runs and tests).
use std::fmt::Debug;

use async_trait::async_trait;
use k8s_openapi::{NamespaceResourceScope, api::core::v1::ConfigMap};
use kube::{Api, Resource, ResourceExt, api::ListParams};
use serde::de::DeserializeOwned;
use snafu::{ResultExt, Snafu};
use tracing::{debug, instrument};

use crate::kvp::{PluginConfigSelector, SelectorError};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to create kubernetes client"))]
    CreateKubeClient { source: kube::Error },

    #[snafu(display("failed to list {kind} objects in namespace {namespace:?}"))]
    ListResources {
        source: kube::Error,
        kind: String,
        namespace: String,
    },

    #[snafu(display("invalid label selector for plugin config"))]
    InvalidSelector { source: SelectorError },
}

/// Something that can list ConfigMaps matching a [`PluginConfigSelector`].
#[async_trait]
pub trait ConfigMapSource: Send + Sync {
    async fn list_config_maps(
        &self,
        namespace: &str,
        selector: &PluginConfigSelector,
    ) -> Result<Vec<ConfigMap>>;
}

/// This `Client` can be used to access Kubernetes.
/// It wraps an underlying [`kube::Client`] and provides the list call the resolver needs.
#[derive(Clone)]
pub struct Client {
    client: kube::Client,
}

impl Client {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }

    /// Creates a client from the ambient kubeconfig or in-cluster service account.
    pub async fn try_default() -> Result<Self> {
        let client = kube::Client::try_default()
            .await
            .context(CreateKubeClientSnafu)?;
        Ok(Self::new(client))
    }

    pub fn get_namespaced_api<T>(&self, namespace: &str) -> Api<T>
    where
        T: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
    {
        Api::namespaced(self.client.clone(), namespace)
    }

    /// Lists all objects of type `T` in `namespace` matching the label selector query string.
    pub async fn list_with_label_selector<T>(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<T>>
    where
        T: Clone + Debug + DeserializeOwned + Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
    {
        let params = ListParams::default().labels(label_selector);
        let list = self
            .get_namespaced_api::<T>(namespace)
            .list(&params)
            .await
            .with_context(|_| ListResourcesSnafu {
                kind: T::kind(&()).into_owned(),
                namespace,
            })?;

        Ok(list.items)
    }
}

#[async_trait]
impl ConfigMapSource for Client {
    #[instrument(skip(self))]
    async fn list_config_maps(
        &self,
        namespace: &str,
        selector: &PluginConfigSelector,
    ) -> Result<Vec<ConfigMap>> {
        let query = selector.to_query_string().context(InvalidSelectorSnafu)?;
        debug!(%query, "listing plugin config maps");
        self.list_with_label_selector(namespace, &query).await
    }
}

/// A fixed set of ConfigMaps, filtered by namespace and selector the same way the API server
/// would.
#[derive(Clone, Debug, Default)]
pub struct StaticConfigMaps {
    config_maps: Vec<ConfigMap>,
}

impl StaticConfigMaps {
    pub fn new(config_maps: Vec<ConfigMap>) -> Self {
        Self { config_maps }
    }
}

#[async_trait]
impl ConfigMapSource for StaticConfigMaps {
    async fn list_config_maps(
        &self,
        namespace: &str,
        selector: &PluginConfigSelector,
    ) -> Result<Vec<ConfigMap>> {
        let mut matching = Vec::new();
        for config_map in &self.config_maps {
            if config_map.namespace().as_deref() != Some(namespace) {
                continue;
            }
            if selector
                .matches(config_map.labels())
                .context(InvalidSelectorSnafu)?
            {
                matching.push(config_map.clone());
            }
        }

        Ok(matching)
    }
}
