//! The restore item actions and the contract between them and the restore host.
//!
//! The host (Velero or the CLI in this crate) asks every action which resources it
//! [applies to](RestoreItemAction::applies_to) and then calls
//! [`execute`](RestoreItemAction::execute) once per matching item. Two actions exist:
//!
//! - [`PodAction`] injects the kubemover init container into Pods of restores from offloaded
//!   data.
//! - [`PvcAction`] tags PersistentVolumeClaims.
//!
//! Every error aborts the current item and is returned to the host as is. Whether that fails the
//! whole restore is up to the host.
use async_trait::async_trait;
use kube::api::DynamicObject;
use serde::{Deserialize, Serialize};
use snafu::Snafu;

use crate::{codec, config::resolver};

pub mod gate;
pub mod kubemover;
pub mod volume;

mod pod;
mod pvc;

pub use gate::{RestoreContext, should_mutate};
pub use pod::{PodAction, mutate_pod};
pub use pvc::PvcAction;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to fetch the plugin config"))]
    ConfigFetch { source: resolver::Error },

    #[snafu(display("the plugin config is invalid"))]
    ConfigValidation { source: resolver::Error },

    #[snafu(display("failed to convert the restore item"))]
    Conversion { source: codec::Error },
}

impl From<resolver::Error> for Error {
    fn from(source: resolver::Error) -> Self {
        if source.is_validation() {
            Self::ConfigValidation { source }
        } else {
            Self::ConfigFetch { source }
        }
    }
}

/// Which items the host hands to an action. Empty lists mean no restriction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSelector {
    pub included_namespaces: Vec<String>,
    pub excluded_namespaces: Vec<String>,
    pub included_resources: Vec<String>,
    pub excluded_resources: Vec<String>,
    pub label_selector: String,
}

impl ResourceSelector {
    /// Selects every item of the given resource, without further filtering.
    pub fn for_resource(resource: impl Into<String>) -> Self {
        Self {
            included_resources: vec![resource.into()],
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug)]
pub struct RestoreItemActionExecuteInput {
    pub restore: RestoreContext,
    pub item: DynamicObject,
}

#[derive(Clone, Debug)]
pub struct RestoreItemActionExecuteOutput {
    pub updated_item: DynamicObject,
}

/// An action run by the restore host on every item its [`ResourceSelector`] matches.
#[async_trait]
pub trait RestoreItemAction: Send + Sync {
    /// The name the action is registered under.
    fn name(&self) -> &'static str;

    fn applies_to(&self) -> ResourceSelector;

    /// Processes a single item. The input is never modified, on error nothing has been applied.
    async fn execute(
        &self,
        input: &RestoreItemActionExecuteInput,
    ) -> Result<RestoreItemActionExecuteOutput>;
}
