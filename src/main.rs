//! Billing and income-tax API server.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use utility_payroll_engine::api::{AppState, create_router};
use utility_payroll_engine::config::ConfigLoader;
use utility_payroll_engine::store::MemoryStore;

#[derive(Parser)]
#[command(name = "utility-payroll-server")]
#[command(about = "Electric utility billing and payroll income-tax API", long_about = None)]
struct Cli {
    /// Configuration directory
    #[arg(short, long, default_value = "./config/default")]
    config: PathBuf,

    /// Address to listen on; overrides engine.yaml
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = ConfigLoader::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    let store = Arc::new(MemoryStore::new());
    let seeded = store
        .seed_slabs(config.slabs().iter().cloned())
        .context("seeding tax slabs")?;
    for slab in &seeded {
        info!(slab_id = slab.id, slab = %slab.name, bands = slab.bands().len(), "Tax slab seeded");
    }

    let state = AppState::from_config(store, &config);
    let app = create_router(state);

    let bind = cli
        .bind
        .unwrap_or_else(|| config.settings().server.bind.clone());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {}", bind))?;

    info!(address = %bind, rounding = ?config.rounding(), "Server listening");
    axum::serve(listener, app).await.context("serving HTTP")?;
    Ok(())
}
