//! DuoKV server entry point.
//!
//! Parses the command line, sets up logging, binds both transports and
//! serves until Ctrl+C.

use clap::Parser;
use duokv::{Config, Server};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn print_banner(config: &Config) {
    println!(
        r#"
DuoKV v{} - In-Memory Key-Value Store
──────────────────────────────────────────────────────────────
Stream   (TCP) on {}  store: {}
Datagram (UDP) on {}  store: {}, workers: {}

Use Ctrl+C to shutdown gracefully.
"#,
        duokv::VERSION,
        config.stream_address(),
        config.stream_store,
        config.datagram_address(),
        config.datagram_store,
        config.datagram_workers,
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    config.validate()?;

    // RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    let server = Server::bind(&config).await?;
    print_banner(&config);

    let stats = server.stats();

    let shutdown = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received, stopping server..."),
            Err(e) => error!(error = %e, "Failed to listen for Ctrl+C"),
        }
    };

    tokio::select! {
        result = server.run() => result?,
        _ = shutdown => {}
    }

    info!(stats = %stats.snapshot(), "Server shutdown complete");
    Ok(())
}
