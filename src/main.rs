use std::path::PathBuf;

use clap::Parser;

use image_gateway::config::{load_config, validation::validate_config, ConfigError, GatewayConfig};
use image_gateway::lifecycle::{signals, Shutdown};
use image_gateway::net::Listener;
use image_gateway::observability::{logging, metrics};
use image_gateway::processing::plain;
use image_gateway::HttpServer;

/// Image transformation gateway.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    logging::init(&config.observability.log_level);

    tracing::info!("image-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        concurrency = config.processing.concurrency,
        write_timeout_secs = config.timeouts.write_secs,
        gzip = config.response.gzip_compression,
        etag = config.response.etag_enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validated at load time.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let collaborators = plain::collaborators(&config.download)?;
    let listener = Listener::bind(&config.listener).await?;
    let server = HttpServer::new(&config, collaborators);

    let shutdown = Shutdown::new();
    let mut server_task = tokio::spawn(server.run(listener, shutdown.signal()));

    tokio::select! {
        _ = signals::wait_for_signal() => {
            shutdown.trigger();
            server_task.await??;
        }
        result = &mut server_task => {
            result??;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
