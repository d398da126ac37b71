use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::constants::RESTORE_FROM_OFFLOAD_ANNOTATION;

/// The parts of the Velero Restore an action looks at.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RestoreContext {
    pub annotations: Option<BTreeMap<String, String>>,
}

impl RestoreContext {
    pub fn from_metadata(metadata: &ObjectMeta) -> Self {
        Self {
            annotations: metadata.annotations.clone(),
        }
    }
}

/// Whether items of this restore get the kubemover init container.
///
/// Only the presence of [`RESTORE_FROM_OFFLOAD_ANNOTATION`] counts, its value is ignored.
pub fn should_mutate(restore: &RestoreContext) -> bool {
    restore
        .annotations
        .as_ref()
        .is_some_and(|annotations| annotations.contains_key(RESTORE_FROM_OFFLOAD_ANNOTATION))
}
