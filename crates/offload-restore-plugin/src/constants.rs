//! Names, keys and well-known values shared between the restore item actions.
use const_format::concatcp;

const PLUGIN_DOMAIN: &str = "catalogicsoftware.com";

/// Name under which the Pod action is registered. It doubles as the key of the presence
/// annotation and as the label key selecting the plugin config record.
pub const POD_ACTION_PLUGIN_NAME: &str =
    concatcp!(PLUGIN_DOMAIN, "/offload-restore-pod-action-plugin");

/// Name under which the PersistentVolumeClaim action is registered.
pub const PVC_ACTION_PLUGIN_NAME: &str =
    concatcp!(PLUGIN_DOMAIN, "/offload-restore-pvc-action-plugin");

/// Kind of every action in this crate, used as the label value selecting the config record.
pub const PLUGIN_KIND: &str = "RestoreItemAction";

/// The value of the presence annotation set on every processed item.
pub const PRESENCE_ANNOTATION_VALUE: &str = "1";

/// Annotation on the Velero Restore marking it as a restore from offloaded data.
/// Only its presence is checked.
pub const RESTORE_FROM_OFFLOAD_ANNOTATION: &str = "cloudcasa-restore-from-offload";

/// Marker label carried by every Velero plugin config record.
pub const PLUGIN_CONFIG_LABEL: &str = "velero.io/plugin-config";

/// Namespace searched for the plugin config record unless overridden.
pub const DEFAULT_CONFIG_NAMESPACE: &str = "cloudcasa-io";

pub const KUBEMOVER_BINARY: &str = "/usr/local/bin/kubemover";

pub const ENV_CLUSTER_ID: &str = "AMDS_CLUSTER_ID";
pub const ENV_POD_NAMESPACE: &str = "POD_NAMESPACE";
pub const ENV_POD_NAME: &str = "POD_NAME";

/// Keys of the plugin config record data.
pub mod config_keys {
    pub const CLUSTER_ID: &str = "clusterID";
    pub const POD_NAME_PREFIX: &str = "kubeMoverPodNamePrefix";
    pub const IMAGE: &str = "kubeMoverImage";
    pub const SERVER_ADDR: &str = "serverAddr";
    pub const USE_TLS: &str = "useTLS";
    pub const CPU_REQUEST: &str = "cpuRequest";
    pub const CPU_LIMIT: &str = "cpuLimit";
    pub const MEM_REQUEST: &str = "memRequest";
    pub const MEM_LIMIT: &str = "memLimit";
    /// Despite the name this holds the numeric user id the container runs as.
    pub const RUN_AS_USER: &str = "runAsRoot";
    pub const RUN_AS_GROUP: &str = "runAsGroup";
    pub const ALLOW_PRIVILEGE_ESCALATION: &str = "allowPrivilegeEscalation";
}

/// Values applied when a resource key is missing from the config record.
///
/// The CPU limit and memory request defaults use the other resource's unit. They are kept
/// as-is so existing config records keep producing the same containers.
pub mod defaults {
    pub const CPU_REQUEST: &str = "100m";
    pub const CPU_LIMIT: &str = "128Mi";
    pub const MEM_REQUEST: &str = "100m";
    pub const MEM_LIMIT: &str = "128Mi";
}
