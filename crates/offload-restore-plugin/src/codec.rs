//! Conversion between the generic restore item and typed Kubernetes objects.
//!
//! Velero hands restore items over as schema-less documents, which are represented by
//! [`DynamicObject`]: typed `apiVersion`/`kind` and `metadata`, with everything else kept as raw
//! JSON. The conversion goes through [`serde_json::Value`] in both directions, so every field
//! known to the typed object survives a round trip.
use k8s_openapi::{Metadata, apimachinery::pkg::apis::meta::v1::ObjectMeta};
use kube::{Resource, api::DynamicObject, core::dynamic::ParseDynamicObjectError};
use serde::{Serialize, de::DeserializeOwned};
use snafu::{ResultExt, Snafu};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display(
        "failed to parse restore item {name:?} as apiVersion {target_api_version:?} and kind {target_kind:?}"
    ))]
    ParseDynamicObject {
        source: ParseDynamicObjectError,
        name: String,
        target_api_version: String,
        target_kind: String,
    },

    #[snafu(display("failed to serialize {kind} {name:?}"))]
    SerializeObject {
        source: serde_json::Error,
        name: String,
        kind: String,
    },

    #[snafu(display("failed to convert {kind} {name:?} to a restore item"))]
    ConvertToItem {
        source: serde_json::Error,
        name: String,
        kind: String,
    },
}

/// Converts a generic restore item into the typed object `K`.
///
/// Fails if the item's `apiVersion`/`kind` belong to another type or a field does not match
/// the schema of `K`.
pub fn from_item<K>(item: &DynamicObject) -> Result<K>
where
    K: Resource<DynamicType = ()> + DeserializeOwned,
{
    item.clone()
        .try_parse()
        .with_context(|_| ParseDynamicObjectSnafu {
            name: item.metadata.name.clone().unwrap_or_default(),
            target_api_version: K::api_version(&()),
            target_kind: K::kind(&()),
        })
}

/// Converts a typed object back into a generic restore item.
pub fn to_item<K>(object: &K) -> Result<DynamicObject>
where
    K: Resource<DynamicType = ()> + Metadata<Ty = ObjectMeta> + Serialize,
{
    let name = || object.metadata().name.clone().unwrap_or_default();

    let value = serde_json::to_value(object).with_context(|_| SerializeObjectSnafu {
        name: name(),
        kind: K::kind(&()),
    })?;

    serde_json::from_value(value).with_context(|_| ConvertToItemSnafu {
        name: name(),
        kind: K::kind(&()),
    })
}
