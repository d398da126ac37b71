use async_trait::async_trait;
use kube::api::DynamicObject;
use tracing::{debug, instrument};

use super::{
    ResourceSelector, RestoreItemAction, RestoreItemActionExecuteInput,
    RestoreItemActionExecuteOutput, Result,
};
use crate::{
    constants::{PRESENCE_ANNOTATION_VALUE, PVC_ACTION_PLUGIN_NAME},
    kvp::annotate,
};

/// Marks every restored PersistentVolumeClaim with its presence annotation and otherwise passes
/// it through. It needs neither the restore gate nor a config record.
#[derive(Clone, Copy, Debug, Default)]
pub struct PvcAction;

#[async_trait]
impl RestoreItemAction for PvcAction {
    fn name(&self) -> &'static str {
        PVC_ACTION_PLUGIN_NAME
    }

    fn applies_to(&self) -> ResourceSelector {
        ResourceSelector::for_resource("persistentvolumeclaims")
    }

    #[instrument(skip_all, fields(item = ?input.item.metadata.name))]
    async fn execute(
        &self,
        input: &RestoreItemActionExecuteInput,
    ) -> Result<RestoreItemActionExecuteOutput> {
        debug!("marking persistent volume claim");

        Ok(RestoreItemActionExecuteOutput {
            updated_item: DynamicObject {
                metadata: annotate(
                    &input.item.metadata,
                    PVC_ACTION_PLUGIN_NAME,
                    PRESENCE_ANNOTATION_VALUE,
                ),
                ..input.item.clone()
            },
        })
    }
}
