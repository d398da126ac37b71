use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Returns a copy of `annotations` with `key` set to `value`, starting from an empty map if
/// there were no annotations at all. The input is left untouched.
pub fn with_annotation(
    annotations: Option<&BTreeMap<String, String>>,
    key: impl Into<String>,
    value: impl Into<String>,
) -> BTreeMap<String, String> {
    let mut annotations = annotations.cloned().unwrap_or_default();
    annotations.insert(key.into(), value.into());
    annotations
}

/// Returns a copy of `metadata` carrying the additional annotation.
pub fn annotate(
    metadata: &ObjectMeta,
    key: impl Into<String>,
    value: impl Into<String>,
) -> ObjectMeta {
    ObjectMeta {
        annotations: Some(with_annotation(metadata.annotations.as_ref(), key, value)),
        ..metadata.clone()
    }
}
