use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Pod, PodSpec};
use kube::api::DynamicObject;
use snafu::ResultExt;
use tracing::{debug, info, instrument};

use super::{
    ConversionSnafu, ResourceSelector, RestoreItemAction, RestoreItemActionExecuteInput,
    RestoreItemActionExecuteOutput, Result,
    gate::{RestoreContext, should_mutate},
    kubemover::{build_kubemover_container, merge_init_container},
    volume::bind_claim_volumes,
};
use crate::{
    client::ConfigMapSource,
    codec,
    config::{PluginConfig, resolver::ConfigResolver},
    constants::{PLUGIN_KIND, POD_ACTION_PLUGIN_NAME, PRESENCE_ANNOTATION_VALUE},
    kvp::annotate,
};

/// Returns a copy of the item carrying the Pod action's presence annotation.
fn mark_processed(item: &DynamicObject) -> DynamicObject {
    DynamicObject {
        metadata: annotate(
            &item.metadata,
            POD_ACTION_PLUGIN_NAME,
            PRESENCE_ANNOTATION_VALUE,
        ),
        ..item.clone()
    }
}

/// Applies the Pod mutation to `item` with an already resolved `config`.
///
/// If the restore is not from offloaded data the item is only marked as processed. Otherwise
/// the kubemover init container is merged into the Pod, mounting all of its claim volumes.
#[instrument(skip_all, fields(pod = ?item.metadata.name, namespace = ?item.metadata.namespace))]
pub fn mutate_pod(
    restore: &RestoreContext,
    item: &DynamicObject,
    config: &PluginConfig,
) -> Result<DynamicObject> {
    if !should_mutate(restore) {
        return Ok(mark_processed(item));
    }

    let mut pod: Pod = codec::from_item(item).context(ConversionSnafu)?;
    let pod_name = pod.metadata.name.clone().unwrap_or_default();

    let spec = pod.spec.get_or_insert_with(PodSpec::default);
    let bindings = bind_claim_volumes(spec.volumes.as_deref());
    let container = build_kubemover_container(config, &pod_name, &bindings);
    info!(
        container = %container.name,
        claims = bindings.len(),
        "injecting kubemover init container"
    );
    spec.init_containers = Some(merge_init_container(spec.init_containers.take(), container));

    pod.metadata = annotate(
        &pod.metadata,
        POD_ACTION_PLUGIN_NAME,
        PRESENCE_ANNOTATION_VALUE,
    );

    codec::to_item(&pod).context(ConversionSnafu)
}

/// Injects the kubemover init container into Pods restored from offloaded data.
///
/// The plugin config record is looked up through the [`ConfigResolver`] for every Pod of such a
/// restore. Pods of other restores are passed through without a lookup.
pub struct PodAction<S> {
    resolver: ConfigResolver<S>,
}

impl<S: ConfigMapSource> PodAction<S> {
    pub fn new(resolver: ConfigResolver<S>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl<S: ConfigMapSource> RestoreItemAction for PodAction<S> {
    fn name(&self) -> &'static str {
        POD_ACTION_PLUGIN_NAME
    }

    fn applies_to(&self) -> ResourceSelector {
        ResourceSelector::for_resource("pods")
    }

    #[instrument(skip_all, fields(item = ?input.item.metadata.name))]
    async fn execute(
        &self,
        input: &RestoreItemActionExecuteInput,
    ) -> Result<RestoreItemActionExecuteOutput> {
        if !should_mutate(&input.restore) {
            debug!("restore is not from offloaded data, passing item through");
            return Ok(RestoreItemActionExecuteOutput {
                updated_item: mark_processed(&input.item),
            });
        }

        let config = self
            .resolver
            .resolve(POD_ACTION_PLUGIN_NAME, PLUGIN_KIND)
            .await?;

        Ok(RestoreItemActionExecuteOutput {
            updated_item: mutate_pod(&input.restore, &input.item, &config)?,
        })
    }
}
