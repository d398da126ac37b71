//! Command line interface for running the restore item actions outside of Velero.
//!
//! The binary reads the Velero Restore and a single restore item from files, runs the selected
//! action and prints the updated item. The plugin config record is either looked up in the
//! cluster or, with `--config-map-file`, taken from a local file.
//!
//! ```no_run
//! use clap::Parser;
//! use offload_restore_plugin::cli::Command;
//!
//! #[derive(clap::Parser)]
//! struct Opts {
//!     #[clap(subcommand)]
//!     command: Command,
//! }
//!
//! let opts = Opts::parse();
//! match opts.command {
//!     Command::AppliesTo(args) => println!("{}", args.action),
//!     Command::Execute(args) => println!("{}", args.item.display()),
//! }
//! ```
use std::path::{Path, PathBuf};

use clap::{Args, Parser};
use k8s_openapi::api::core::v1::ConfigMap;
use serde::{Deserialize, de::DeserializeOwned};
use snafu::{ResultExt, Snafu};

use crate::constants::DEFAULT_CONFIG_NAMESPACE;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to read file {path:?}"))]
    ReadFile {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to parse YAML document in {path:?}"))]
    ParseYaml {
        source: serde_yaml::Error,
        path: PathBuf,
    },
}

#[derive(Debug, PartialEq, Eq, Parser)]
pub enum Command {
    /// Print the resource selector of an action.
    AppliesTo(AppliesToArguments),

    /// Run an action on a single restore item and print the updated item.
    Execute(ExecuteArguments),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ActionKind {
    /// The action injecting the kubemover init container into Pods.
    Pod,

    /// The action marking PersistentVolumeClaims.
    Pvc,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

#[derive(Debug, PartialEq, Eq, Args)]
pub struct AppliesToArguments {
    #[arg(long, value_enum)]
    pub action: ActionKind,
}

#[derive(Debug, PartialEq, Eq, Args)]
pub struct ExecuteArguments {
    #[arg(long, value_enum)]
    pub action: ActionKind,

    /// Path to the Velero Restore the item belongs to (YAML or JSON)
    #[arg(long, value_name = "FILE")]
    pub restore: PathBuf,

    /// Path to the restore item (YAML or JSON)
    #[arg(long, value_name = "FILE")]
    pub item: PathBuf,

    /// Namespace searched for the plugin config record
    #[arg(long, env = "OFFLOAD_RESTORE_CONFIG_NAMESPACE", default_value = DEFAULT_CONFIG_NAMESPACE)]
    pub config_namespace: String,

    /// Read the plugin config records from this file (multiple YAML documents) instead of
    /// querying the cluster
    #[arg(long, value_name = "FILE")]
    pub config_map_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t)]
    pub output: OutputFormat,
}

/// Reads a single YAML (or JSON) document from `path`.
pub async fn load_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .context(ReadFileSnafu { path })?;

    serde_yaml::from_str(&contents).context(ParseYamlSnafu { path })
}

/// Reads all ConfigMaps from the YAML documents in `path`.
pub async fn load_config_maps(path: &Path) -> Result<Vec<ConfigMap>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .context(ReadFileSnafu { path })?;

    parse_config_maps(&contents).context(ParseYamlSnafu { path })
}

fn parse_config_maps(contents: &str) -> Result<Vec<ConfigMap>, serde_yaml::Error> {
    serde_yaml::Deserializer::from_str(contents)
        .map(ConfigMap::deserialize)
        .collect()
}
