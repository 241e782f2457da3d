use collab_bench::LoadDriver;
use collab_bench::config::{Args, BenchConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::from_cli();

    // Initialize tracing
    let default_filter = if args.verbose {
        "collab_bench=debug"
    } else {
        "collab_bench=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Select the TLS backend for wss:// before any client connects.
    // Fails only if a provider is already installed, which is fine.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = BenchConfig::from(args);
    config.validate()?;
    info!("Connection string: {}", config.url());
    info!(
        "Script: {} changes per phase, at least {:?} per client",
        config.script.messages,
        config.script.min_duration()
    );

    let driver = LoadDriver::new(config);
    let summary = driver.run().await;

    for line in summary.report().lines() {
        info!("{}", line);
    }
    println!("{}", summary);

    Ok(())
}
