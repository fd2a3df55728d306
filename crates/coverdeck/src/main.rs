use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;

use coverdeck::api;
use coverdeck::cards::build_card;
use coverdeck::config::Config;
use coverdeck::host::run_delivery;
use coverdeck::host::Host;
use coverdeck::host::LoopbackTransport;
use coverdeck::host::ServiceBus;

#[derive(Parser)]
#[command(name = "coverdeck", about = "Window-covering dashboard card server")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "coverdeck.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::from_file(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from(config.logging.level))
        .init();

    info!("coverdeck starting");
    info!("Loaded config from: {}", args.config.display());

    let (bus, bus_rx) = ServiceBus::channel();
    let mut host = Host::new(bus);

    // Seed the snapshot before any card can render.
    for (entity_id, attributes) in &config.entities {
        host.set_entity(entity_id.clone(), attributes.clone());
    }
    info!("Seeded {} entities", config.entities.len());

    for entry in &config.cards {
        let card = build_card(entry)
            .with_context(|| format!("failed to build '{}' card", entry.kind))?;
        host.add_card(card);
    }

    let host = Arc::new(host);

    let delivery = tokio::spawn(run_delivery(
        bus_rx,
        Box::new(LoopbackTransport::new(host.clone())),
    ));

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            let _ = shutdown_tx.send(());
        }
    });

    api::serve(
        host.clone(),
        config.api.listen.clone(),
        config.api.port,
        shutdown_rx,
    )
    .await?;

    // The transport holds the host (and with it a bus sender), so the
    // delivery loop will not drain itself closed; stop it directly.
    delivery.abort();

    info!("coverdeck shutdown complete");
    Ok(())
}
