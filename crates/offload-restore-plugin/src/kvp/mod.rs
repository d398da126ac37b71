//! Helpers for Kubernetes key/value pairs: label selectors used to find the plugin config
//! record, and annotations set on restored items.
mod annotation;
mod selector;

pub use annotation::*;
pub use selector::*;
