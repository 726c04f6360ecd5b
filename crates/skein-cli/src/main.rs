//! `skein`: administration tool for the skein record index.
//!
//! Reads `skein.toml` (or the path given with `--config`) and `SKEIN_*`
//! environment variables, opens the SQLite store and runs one command.
//!
//! # Usage
//!
//! ```
//! skein init
//! skein put did:example:alice/bsky/identity/self '{"username":"alice"}'
//! skein put did:example:alice/bsky/posts/3 '{"text":"hello","createdAt":"2024-01-01T00:00:00Z"}'
//! skein get did:example:alice/bsky/posts/3
//! ```

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use settings::Settings;
use skein_core::{
  id::{Did, RecordUri},
  oracle::SchemaSet,
};
use skein_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "skein record index administration")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "skein.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Create every index table on a fresh database.
  Init,
  /// Drop every index table and create them again, empty.
  Reset,
  /// Drop a single table if it exists.
  DropTable { name: String },
  /// Validate a JSON record and index it at URI.
  Put { uri: RecordUri, json: String },
  /// Print the record indexed at URI.
  Get { uri: RecordUri },
  /// Remove the record indexed at URI.
  Delete { uri: RecordUri },
  /// Repository roots.
  #[command(subcommand)]
  Root(RootCommand),
  /// List the registered collections and their tables.
  Collections,
}

#[derive(Subcommand)]
enum RootCommand {
  /// Record ROOT as the current repository root for DID.
  Set { did: Did, root: String },
  Get { did: Did },
  Delete { did: Did },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = Settings::load(&cli.config).context("failed to read configuration")?;

  let store = SqliteStore::open(&settings.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.store_path))?;
  let index = store
    .dispatcher(Arc::new(SchemaSet::builtin()))
    .context("failed to register plugins")?;

  match cli.command {
    Command::Init => {
      store.create_all().await.context("failed to create schema")?;
    }
    Command::Reset => {
      store.drop_all().await.context("failed to drop schema")?;
      store.create_all().await.context("failed to create schema")?;
    }
    Command::DropTable { name } => {
      store
        .drop_table(&name)
        .await
        .with_context(|| format!("failed to drop {name}"))?;
    }
    Command::Put { uri, json } => {
      let payload = serde_json::from_str(&json).context("record is not valid JSON")?;
      index
        .set(&uri, payload)
        .await
        .with_context(|| format!("failed to index {uri}"))?;
    }
    Command::Get { uri } => {
      match index
        .get(&uri)
        .await
        .with_context(|| format!("failed to read {uri}"))?
      {
        Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        None => anyhow::bail!("no record at {uri}"),
      }
    }
    Command::Delete { uri } => {
      index
        .delete(&uri)
        .await
        .with_context(|| format!("failed to remove {uri}"))?;
    }
    Command::Root(RootCommand::Set { did, root }) => {
      store.set_repo_root(&did, &root).await?;
    }
    Command::Root(RootCommand::Get { did }) => match store.repo_root(&did).await? {
      Some(root) => println!("{root}"),
      None => anyhow::bail!("no repository root for {did}"),
    },
    Command::Root(RootCommand::Delete { did }) => {
      store.delete_repo_root(&did).await?;
    }
    Command::Collections => {
      for name in index.collections() {
        let plugin = index.plugin(name)?;
        println!("{name}\t{}\t{}", plugin.table_name(), plugin.schema_id());
      }
    }
  }

  Ok(())
}
