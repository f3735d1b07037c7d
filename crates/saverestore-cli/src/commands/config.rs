//! Configuration commands
//!
//! PVs are given as repeated `--pv <name>` flags, in the order they should
//! be read and stored.

use clap::{Args, Subcommand};
use saverestore_core::errors::ExError;
use saverestore_core::model::{
    ConfigPvDefinition, ConfigurationUpdate, NewConfiguration, NodeId, ROOT_NODE_ID,
};
use saverestore_engine::EngineCommand;

use super::session::{print_json, Session};

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Args)]
pub struct ConfigDetails {
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long)]
    pub system: Option<String>,
    #[arg(long)]
    pub active: bool,
    /// PV name; repeat for each PV
    #[arg(long = "pv")]
    pub pvs: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create a configuration
    Create {
        #[arg(long, default_value_t = ROOT_NODE_ID)]
        parent: NodeId,
        #[command(flatten)]
        details: ConfigDetails,
    },
    /// Replace a configuration's details and PV list
    Update {
        id: NodeId,
        #[command(flatten)]
        details: ConfigDetails,
    },
    /// List all configurations
    List,
    /// Show one configuration with its PVs
    Show { id: NodeId },
}

fn definitions(pvs: Vec<String>) -> Vec<ConfigPvDefinition> {
    pvs.into_iter().map(ConfigPvDefinition::new).collect()
}

pub async fn execute(args: ConfigArgs, session: &mut Session) -> Result<(), ExError> {
    let cmd = match args.command {
        ConfigCommand::Create { parent, details } => {
            EngineCommand::CreateConfiguration(NewConfiguration {
                name: details.name,
                parent_id: Some(parent),
                description: details.description,
                system: details.system,
                active: details.active,
                pvs: definitions(details.pvs),
            })
        }
        ConfigCommand::Update { id, details } => {
            EngineCommand::UpdateConfiguration(ConfigurationUpdate {
                id,
                name: details.name,
                description: details.description,
                system: details.system,
                active: details.active,
                pvs: definitions(details.pvs),
            })
        }
        ConfigCommand::List => EngineCommand::GetConfigurations,
        ConfigCommand::Show { id } => EngineCommand::GetConfiguration { id },
    };
    print_json(&session.run(cmd).await?)
}
