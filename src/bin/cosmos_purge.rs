use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use cosmos_purge::shell::{
    Prompter, SessionOptions, confirm_start, prompt_connection, run_session,
};
use cosmos_purge::{CosmosClient, CosmosConfig, DeletionManager, Predicate};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "cosmos-purge",
    version,
    about = "Bulk-delete Cosmos DB documents matching a WHERE clause"
)]
struct Args {
    /// Config file (json, toml, yaml)
    #[arg(long, env = "COSMOS_PURGE_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long)]
    endpoint: Option<String>,

    /// Account master key
    #[arg(long)]
    key: Option<String>,

    #[arg(long)]
    database: Option<String>,

    #[arg(long)]
    collection: Option<String>,

    /// Query across partitions and route deletes by partition key
    #[arg(long)]
    cross_partition: bool,

    /// Document field holding the partition key (cross-partition mode)
    #[arg(long)]
    partition_key: Option<String>,

    /// Run a single WHERE clause and exit
    #[arg(long = "where")]
    where_clause: Option<String>,

    /// Skip the confirmation prompts
    #[arg(long)]
    yes: bool,

    /// Accept the self-signed certificate of a local emulator
    #[arg(long)]
    accept_invalid_certs: bool,
}

impl Args {
    fn apply(&self, config: &mut CosmosConfig) {
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(key) = &self.key {
            config.set_account_key(key.clone());
        }
        if let Some(database) = &self.database {
            config.database = database.clone();
        }
        if let Some(collection) = &self.collection {
            config.collection = collection.clone();
        }
        if let Some(field) = &self.partition_key {
            config.partition_key_field = field.clone();
        }
        config.cross_partition |= self.cross_partition;
        config.accept_invalid_certs |= self.accept_invalid_certs;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("cosmos_purge=info".parse()?))
        .init();

    let args = Args::parse();

    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());

    if !args.yes && !confirm_start(&mut prompter)? {
        return Ok(());
    }

    let mut config = CosmosConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    if !config.is_complete() {
        prompt_connection(&mut prompter, &mut config)?;
    }
    config.validate()?;

    info!(
        "Connecting to {} ({})",
        config.endpoint,
        config.collection_link()
    );
    let client = CosmosClient::new(config)?;
    let manager = DeletionManager::new(Arc::new(client));

    let options = SessionOptions {
        assume_yes: args.yes,
        predicate: args.where_clause.as_deref().map(Predicate::new),
    };
    let summary = run_session(&manager, &mut prompter, &options).await?;

    if summary.aborted_runs > 0 {
        anyhow::bail!("{} delete run(s) aborted", summary.aborted_runs);
    }
    Ok(())
}
