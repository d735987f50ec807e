use clap::{Parser, Subcommand};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use vigil_bybit::BybitClient;
use vigil_coingecko::CoinGeckoClient;
use vigil_core::{Alert, AlertDispatcher, AlertSink, ConfigLoader};
use vigil_monitor::{
    FundingChecker, LiquidationStream, MarketCatalog, PollingScheduler, ReconnectSupervisor,
    VariationChecker,
};
use vigil_notify::PushbulletNotifier;

#[derive(Parser)]
#[command(name = "vigil")]
#[command(about = "Bybit market anomaly alert daemon", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the alert daemon (polling checks + liquidation stream)
    Run {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
    /// Send a test notification through the configured channel
    TestPush {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
    /// Discover and print the tradable symbol universe
    Symbols {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { config } => run_daemon(&config).await?,
        Commands::TestPush { config } => run_test_push(&config).await?,
        Commands::Symbols { config } => run_symbols(&config).await?,
    }

    Ok(())
}

async fn run_daemon(config_path: &str) -> anyhow::Result<()> {
    let config = ConfigLoader::load_from(config_path)?;

    let bybit = Arc::new(BybitClient::new(config.bybit.api_url.clone()));
    let gecko = Arc::new(CoinGeckoClient::new(config.coingecko.api_url.clone()));
    let sink: Arc<dyn AlertSink> = Arc::new(PushbulletNotifier::new(
        config.pushbullet.api_url.clone(),
        config.pushbullet.token.clone(),
    ));
    let dispatcher = AlertDispatcher::new(sink);

    let catalog = MarketCatalog::new(Arc::clone(&bybit));
    let variation = VariationChecker::new(
        Arc::clone(&gecko),
        dispatcher.clone(),
        config.alerts.variation_pct,
    );
    let funding = FundingChecker::new(
        Arc::clone(&bybit),
        dispatcher.clone(),
        config.alerts.funding_rate,
    );
    let mut scheduler = PollingScheduler::new(
        catalog,
        variation,
        funding,
        Duration::from_secs(config.alerts.poll_interval_minutes * 60),
    );
    let poll_stop = scheduler.stop_handle();

    let supervisor = ReconnectSupervisor::new(Duration::from_secs(5));
    let stream_stop = supervisor.stop_handle();
    let mut stream = LiquidationStream::new(
        Arc::clone(&bybit),
        config.bybit.ws_url.clone(),
        dispatcher.clone(),
        config.alerts.min_liquidation_usd,
    )
    .with_stop_handle(Arc::clone(&stream_stop));

    let poll_task = tokio::spawn(async move { scheduler.run().await });
    let stream_task = tokio::spawn(async move { supervisor.supervise(&mut stream).await });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");
    poll_stop.store(true, Ordering::SeqCst);
    stream_stop.store(true, Ordering::SeqCst);
    poll_task.abort();
    stream_task.abort();

    Ok(())
}

async fn run_test_push(config_path: &str) -> anyhow::Result<()> {
    let config = ConfigLoader::load_from(config_path)?;
    let notifier = PushbulletNotifier::new(config.pushbullet.api_url, config.pushbullet.token);

    let devices = notifier.devices().await?;
    if devices.is_empty() {
        anyhow::bail!("no Pushbullet devices registered");
    }
    println!("Registered devices:");
    for device in &devices {
        println!(
            "- {} ({})",
            device.nickname.as_deref().unwrap_or("unnamed"),
            device.iden
        );
    }

    let alert = Alert::new("vigil test push", "If you can read this, delivery works.");
    notifier.deliver(&alert).await?;
    println!("Test notification sent.");

    Ok(())
}

async fn run_symbols(config_path: &str) -> anyhow::Result<()> {
    let config = ConfigLoader::load_from(config_path)?;
    let bybit = Arc::new(BybitClient::new(config.bybit.api_url));
    let catalog = MarketCatalog::new(bybit);

    let universe = catalog.discover().await?;
    for symbol in universe.iter() {
        println!("{symbol}");
    }
    println!("{} symbols", universe.len());

    Ok(())
}
