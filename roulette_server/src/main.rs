//! Live roulette server using an async actor model.
//!
//! One table actor runs the shared round clock; every WebSocket connection
//! is a participant at that table.

use std::net::SocketAddr;

use anyhow::Error;
use log::{info, warn};
use pico_args::Arguments;
use roulette::TableActor;
use roulette_server::{api, config::ServerConfig, logging, metrics};

const HELP: &str = "\
Run a live roulette server

USAGE:
  roulette_server [OPTIONS]

OPTIONS:
  --bind          IP:PORT  Server socket bind address   [default: env SERVER_BIND or 127.0.0.1:6969]
  --metrics-bind  IP:PORT  Prometheus exporter address  [default: env METRICS_BIND, off if unset]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND                 Server bind address (e.g., 0.0.0.0:8080)
  METRICS_BIND                Prometheus exporter address (e.g., 0.0.0.0:9090)
  ROULETTE_BETTING_SECS       Betting phase length in seconds       [default: 30]
  ROULETTE_LOCKOUT_SECS       Bets close at this many seconds left  [default: 5]
  ROULETTE_SPIN_MS            Spin animation length in ms           [default: 4500]
  ROULETTE_STARTING_BALANCE   Balance of every new participant      [default: 1000]
  ROULETTE_TICK_MS            Clock tick period in ms               [default: 1000]
  ROULETTE_TABLE_NAME         Table name shown in health checks     [default: Roulette]
  ROULETTE_EVENT_BUFFER       Outbound events queued per connection [default: 64]
  RUST_LOG                    Log filter                            [default: info]
";

struct Args {
    bind: Option<SocketAddr>,
    metrics_bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        metrics_bind: pargs.opt_value_from_str("--metrics-bind")?,
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        anyhow::bail!("Unknown arguments: {:?}", remaining);
    }

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.metrics_bind)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(|e| anyhow::anyhow!(e))?;
        info!("Prometheus metrics at http://{}/metrics", addr);
    }

    let (actor, table) = TableActor::new(config.table.clone());
    let table_task = tokio::spawn(actor.run());

    let app = api::create_router(api::AppState::new(table.clone(), config.table.clone()));

    info!("Starting HTTP/WebSocket server on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");

    if table.shutdown().await.is_err() {
        warn!("Table already stopped");
    }
    table_task.await?;

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
