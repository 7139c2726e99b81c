//! Command-line front end for a filesystem-backed JSON data store.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use json_store_core::storage::FileRepository;
use json_store_core::{
    JsonDataMetadata, JsonDataStore, PermissionSet, Principal, StoreError, UpsertRequest, WriteMode,
};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "json-store")]
#[command(about = "Path-addressable JSON document store")]
struct Cli {
    /// Data directory, overrides JSON_STORE_DATA_DIR
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// User the command runs as
    #[arg(long, global = true, default_value = "cli")]
    user: String,

    /// Comma-separated permission groups of the user
    #[arg(long, global = true, default_value = "")]
    groups: String,

    /// Run with administrator rights
    #[arg(long, global = true)]
    admin: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List xids readable by the user
    List,

    /// Show a document, or the node at a dotted path
    Get {
        xid: String,
        path: Option<String>,
    },

    /// Show a public document without permission checks
    GetPublic {
        xid: String,
        path: Option<String>,
    },

    /// Append data to an existing document
    Put(WriteArgs),

    /// Replace data, creating the document when the xid is unknown
    Post(WriteArgs),

    /// Create a new document, failing if the xid exists
    Create {
        xid: String,
        /// JSON payload
        data: String,
        #[command(flatten)]
        metadata: MetadataArgs,
    },

    /// Delete a document, or the member at a dotted path
    Delete {
        xid: String,
        path: Option<String>,
    },
}

#[derive(Args)]
struct WriteArgs {
    xid: String,
    /// JSON payload
    data: String,
    /// Dotted path inside the document
    #[arg(long)]
    path: Option<String>,
    #[command(flatten)]
    metadata: MetadataArgs,
}

#[derive(Args)]
struct MetadataArgs {
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long)]
    public: bool,
    /// Comma-separated read permission groups
    #[arg(long, default_value = "")]
    read_permission: String,
    /// Comma-separated edit permission groups
    #[arg(long, default_value = "")]
    edit_permission: String,
}

impl From<MetadataArgs> for JsonDataMetadata {
    fn from(args: MetadataArgs) -> Self {
        JsonDataMetadata {
            name: args.name,
            public_data: args.public,
            read_permission: PermissionSet::explode(&args.read_permission),
            edit_permission: PermissionSet::explode(&args.edit_permission),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    let data_dir = cli.data_dir.clone().unwrap_or(config.data_dir.clone());

    let repository = FileRepository::new(&data_dir)
        .with_context(|| format!("opening data directory {}", data_dir.display()))?;
    info!("using data directory {}", repository.data_dir().display());
    let store = JsonDataStore::new(Arc::new(repository));

    let principal = Principal {
        user_id: cli.user.clone(),
        admin: cli.admin,
        groups: PermissionSet::explode(&cli.groups).iter().cloned().collect(),
    };

    run(&store, &principal, cli.command, &config).await
}

async fn run(store: &JsonDataStore, principal: &Principal, command: Commands, config: &Config) -> Result<()> {
    let initiator = config.initiator_id.as_deref();
    match command {
        Commands::List => {
            let xids = store.list(principal).await.map_err(report)?;
            print_json(&xids)
        }
        Commands::Get { xid, path } => {
            let doc = store.get(principal, &xid, path.as_deref()).await.map_err(report)?;
            print_json(&doc)
        }
        Commands::GetPublic { xid, path } => {
            let doc = store.get_public(&xid, path.as_deref()).await.map_err(report)?;
            print_json(&doc)
        }
        Commands::Put(args) => write(store, principal, args, WriteMode::Append, initiator).await,
        Commands::Post(args) => write(store, principal, args, WriteMode::Replace, initiator).await,
        Commands::Create { xid, data, metadata } => {
            let data = parse_data(&data)?;
            let doc = store
                .create(principal, &xid, data, metadata.into(), initiator)
                .await
                .map_err(report)?;
            print_json(&doc)
        }
        Commands::Delete { xid, path } => {
            let doc = store
                .delete_path(principal, &xid, path.as_deref(), initiator)
                .await
                .map_err(report)?;
            print_json(&doc)
        }
    }
}

async fn write(
    store: &JsonDataStore,
    principal: &Principal,
    args: WriteArgs,
    mode: WriteMode,
    initiator: Option<&str>,
) -> Result<()> {
    let mut request = UpsertRequest::new(args.xid, mode, parse_data(&args.data)?).metadata(args.metadata.into());
    request.path = args.path;
    request.initiator_id = initiator.map(str::to_string);
    let doc = store.upsert(principal, request).await.map_err(report)?;
    print_json(&doc)
}

fn parse_data(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).context("payload is not valid JSON")
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print validation messages before turning the error into a failure exit.
fn report(err: StoreError) -> anyhow::Error {
    if let StoreError::ValidationFailed { messages, .. } = &err {
        for message in messages {
            eprintln!("{:?} {}: {}", message.level, message.property, message.key);
        }
    }
    err.into()
}
