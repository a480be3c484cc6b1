mod cli;

use hordebrowse::{
    config,
    console::Console,
    filter::FilterCriteriaBuilder,
    launcher::Launcher,
    pipeline::ResultsView,
    presentation::PresentationRegistry,
    resolver::BithordeResolver,
};
use hordebrowse_common::PathScope;
use hordebrowse_db::SqliteStore;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise keep the console readable
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "hordebrowse=info,hordebrowse_db=warn".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = config::load_config_or_default()?;

    let db_path = config::expand(&config.database.path);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
    }
    tracing::info!("Opening metadata database at {:?}", db_path);
    let store = Arc::new(
        SqliteStore::open(&db_path.to_string_lossy())
            .with_context(|| format!("Failed to open database: {:?}", db_path))?,
    );

    let socket = config::expand(&config.bithorde.socket.to_string_lossy());
    let resolver = Arc::new(
        BithordeResolver::start(
            &socket,
            Duration::from_secs(config.bithorde.connect_timeout_secs),
        )
        .context("Cannot browse without a bithorde connection")?,
    );

    let launcher = match Launcher::discover(&config.browse.opener) {
        Ok(launcher) => Some(launcher),
        Err(e) => {
            tracing::warn!("Opening assets is disabled: {}", e);
            None
        }
    };

    let scope = cli.path.as_deref().map(PathScope::parse).unwrap_or_default();
    let view = ResultsView::new(
        store.clone(),
        resolver.clone(),
        Arc::new(PresentationRegistry::standard()),
        config.bithorde.pressure,
    )
    .with_sort_key(config.browse.sort)
    .with_scope(scope);
    let filter = FilterCriteriaBuilder::new(store);
    let fusedir = config::expand(&config.bithorde.fusedir.to_string_lossy());

    let mut console = Console::new(view, filter, launcher, fusedir, std::io::stdout());

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = rt.block_on(async {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        console.run(stdin).await
    });

    drop(console);
    // A pending stdin read would otherwise hold the runtime open
    rt.shutdown_background();
    match Arc::try_unwrap(resolver) {
        Ok(resolver) => resolver.shutdown(),
        Err(_) => tracing::debug!("Resolver still shared at exit"),
    }

    result
}
