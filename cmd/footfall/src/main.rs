//! footfall - HTTP backend for person sightings, carts and orders.

mod config;
mod server;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use footfall_kv::{KVStore, MemoryStore, RedbStore};
use footfall_people::PeopleService;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, StorageConfig};

/// HTTP backend for person sightings, carts and orders.
#[derive(Parser, Debug)]
#[command(name = "footfall")]
#[command(about = "Deduplicating person-sighting backend")]
struct Args {
    /// YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address (e.g. :8080 or 127.0.0.1:8080)
    #[arg(short, long)]
    listen: Option<String>,

    /// Database file; overrides the configured storage
    #[arg(long)]
    data: Option<PathBuf>,

    /// Keep everything in memory (nothing is persisted)
    #[arg(long, conflicts_with = "data")]
    memory: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(listen) = args.listen {
        cfg.listen = listen;
    }
    if let Some(path) = args.data {
        cfg.storage = StorageConfig::Redb { path };
    }
    if args.memory {
        cfg.storage = StorageConfig::Memory;
    }
    cfg.validate()?;

    let store: Box<dyn KVStore> = match &cfg.storage {
        StorageConfig::Memory => {
            info!("using in-memory storage");
            Box::new(MemoryStore::new())
        }
        StorageConfig::Redb { path } => {
            info!(path = %path.display(), "opening database");
            Box::new(
                RedbStore::open(path)
                    .with_context(|| format!("open database {}", path.display()))?,
            )
        }
    };

    let svc = Arc::new(PeopleService::new(store, cfg.service()));
    server::start_server(&cfg.listen, svc).await
}
