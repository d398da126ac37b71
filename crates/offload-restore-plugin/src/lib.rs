//! Velero restore item actions for restores from offloaded data.
//!
//! When a Restore carries the `cloudcasa-restore-from-offload` annotation, the
//! [`PodAction`](restore::PodAction) injects a kubemover init container into every restored Pod.
//! The container mounts each PersistentVolumeClaim of the Pod and moves the offloaded data into
//! place before the Pod's own containers start. The kubemover settings come from a plugin config
//! record (a labelled ConfigMap), see [`config::resolver`].

pub mod builder;
pub mod cli;
pub mod client;
pub mod codec;
pub mod config;
pub mod constants;
pub mod kvp;
pub mod logging;
pub mod quantity;
pub mod restore;

// External re-exports
pub use k8s_openapi;
pub use kube;
