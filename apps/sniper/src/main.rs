use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use appointment_cell::AvailabilitySource;
use notification_cell::ChannelRegistry;
use shared_config::{expand_home, AppConfig};
use shared_portal::LuxmedClient;
use sniper_cell::{run_every, CheckOrchestrator, SchedulerConfig, DEFAULT_DELAY_SECONDS};

/// Watches the LuxMed portal for free appointments and announces new ones.
#[derive(Parser, Debug)]
#[command(name = "luxmed-sniper", version, about)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "luxmedSniper.yaml", env = "LUXMED_SNIPER_CONFIG")]
    config: PathBuf,

    /// Seconds to wait between checks
    #[arg(short, long, default_value_t = DEFAULT_DELAY_SECONDS)]
    delay: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("LuxMed Sniper starting");

    if let Err(e) = run(args).await {
        error!("{:#}", e);
        return Err(e);
    }

    Ok(())
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config_path = expand_home(&args.config);
    let config = AppConfig::load(&config_path)
        .with_context(|| format!("Cannot load configuration from {}", config_path.display()))?;

    let portal: Arc<dyn AvailabilitySource> =
        Arc::new(LuxmedClient::new(&config).context("Cannot set up the portal client")?);

    let mut sniper = CheckOrchestrator::from_config(&config, portal, &ChannelRegistry::with_defaults())
        .context("Cannot set up the sniper")?;

    let scheduler = SchedulerConfig {
        delay_seconds: args.delay,
    };

    let cycles = run_every(&mut sniper, &scheduler, shutdown_signal())
        .await
        .context("Sniper stopped")?;
    info!("Stopped after {} checks", cycles);

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
