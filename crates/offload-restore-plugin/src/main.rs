use clap::Parser;
use kube::api::DynamicObject;
use offload_restore_plugin::{
    cli::{self, ActionKind, Command, ExecuteArguments, OutputFormat},
    client::{self, Client, StaticConfigMaps},
    config::resolver::ConfigResolver,
    constants::DEFAULT_CONFIG_NAMESPACE,
    logging,
    restore::{
        self, PodAction, PvcAction, RestoreContext, RestoreItemAction,
        RestoreItemActionExecuteInput,
    },
};
use snafu::{ResultExt, Snafu};
use tracing::info;

const APP_NAME: &str = "offload-restore-plugin";

#[derive(clap::Parser)]
#[command(
    name = "Offload Restore Plugin",
    author,
    version,
    about = "Velero restore item actions for restores from offloaded data"
)]
struct Opts {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to initialize logging"))]
    InitializeLogging { source: logging::Error },

    #[snafu(display("failed to load input"))]
    LoadInput { source: cli::Error },

    #[snafu(display("failed to connect to kubernetes"))]
    CreateClient { source: client::Error },

    #[snafu(display("action {action} failed"))]
    ExecuteAction {
        source: restore::Error,
        action: &'static str,
    },

    #[snafu(display("failed to serialize output as YAML"))]
    SerializeYaml { source: serde_yaml::Error },

    #[snafu(display("failed to serialize output as JSON"))]
    SerializeJson { source: serde_json::Error },
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let opts = Opts::parse();
    logging::initialize_logging("OFFLOAD_RESTORE_PLUGIN_LOG", APP_NAME)
        .context(InitializeLoggingSnafu)?;

    match opts.command {
        Command::AppliesTo(args) => {
            // The selector does not depend on any config, so no source is needed.
            let action = action_without_config(args.action);
            let selector = action.applies_to();
            print!(
                "{}",
                serde_yaml::to_string(&selector).context(SerializeYamlSnafu)?
            );
        }
        Command::Execute(args) => execute(args).await?,
    }

    Ok(())
}

fn action_without_config(kind: ActionKind) -> Box<dyn RestoreItemAction> {
    match kind {
        ActionKind::Pod => Box::new(PodAction::new(ConfigResolver::new(
            StaticConfigMaps::default(),
            DEFAULT_CONFIG_NAMESPACE,
        ))),
        ActionKind::Pvc => Box::new(PvcAction),
    }
}

async fn build_action(args: &ExecuteArguments) -> Result<Box<dyn RestoreItemAction>, Error> {
    let action: Box<dyn RestoreItemAction> = match (args.action, &args.config_map_file) {
        (ActionKind::Pvc, _) => Box::new(PvcAction),
        (ActionKind::Pod, Some(path)) => {
            let config_maps = cli::load_config_maps(path)
                .await
                .context(LoadInputSnafu)?;
            Box::new(PodAction::new(ConfigResolver::new(
                StaticConfigMaps::new(config_maps),
                &args.config_namespace,
            )))
        }
        (ActionKind::Pod, None) => {
            let client = Client::try_default().await.context(CreateClientSnafu)?;
            Box::new(PodAction::new(ConfigResolver::new(
                client,
                &args.config_namespace,
            )))
        }
    };

    Ok(action)
}

async fn execute(args: ExecuteArguments) -> Result<(), Error> {
    let restore: DynamicObject = cli::load_yaml(&args.restore)
        .await
        .context(LoadInputSnafu)?;
    let item: DynamicObject = cli::load_yaml(&args.item).await.context(LoadInputSnafu)?;

    let action = build_action(&args).await?;
    info!(
        action = action.name(),
        restore = ?restore.metadata.name,
        item = ?item.metadata.name,
        "executing restore item action"
    );

    let output = action
        .execute(&RestoreItemActionExecuteInput {
            restore: RestoreContext::from_metadata(&restore.metadata),
            item,
        })
        .await
        .context(ExecuteActionSnafu {
            action: action.name(),
        })?;

    match args.output {
        OutputFormat::Yaml => print!(
            "{}",
            serde_yaml::to_string(&output.updated_item).context(SerializeYamlSnafu)?
        ),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&output.updated_item).context(SerializeJsonSnafu)?
        ),
    }

    Ok(())
}
