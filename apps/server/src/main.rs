//! Lanstream Server - standalone LAN media server.
//!
//! Serves the songs and cover art found in a media directory to devices on
//! the local network. Runs until Ctrl+C or SIGTERM.

mod config;

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use lanstream_core::{
    DirectoryCatalog, IpDetector, LocalFileAccess, LocalIpDetector, MediaServer, StaticIpDetector,
};
use tokio::signal;

use crate::config::ServerConfig;

/// Lanstream Server - stream a music folder to devices on your LAN.
#[derive(Parser, Debug)]
#[command(name = "lanstream-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "LANSTREAM_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Bind port (overrides config file).
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Advertise IP address (overrides config file).
    #[arg(short = 'a', long)]
    advertise_ip: Option<Ipv4Addr>,

    /// Media directory to serve (overrides config file).
    #[arg(short = 'm', long, value_name = "DIR")]
    media_dir: Option<PathBuf>,

    /// Include subdirectories of the media directory.
    #[arg(short, long)]
    recursive: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("Lanstream Server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config =
        ServerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Apply CLI overrides
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(ip) = args.advertise_ip {
        config.advertise_ip = Some(ip);
    }
    if let Some(dir) = args.media_dir {
        config.media_dir = Some(dir);
    }
    if args.recursive {
        config.recursive = true;
    }

    let media_dir = config.media_dir.clone().context(
        "No media directory configured. \
         Please pass --media-dir or set LANSTREAM_MEDIA_DIR.",
    )?;

    // Explicit advertise IP wins over auto-detection
    let detector: Arc<dyn IpDetector> = if let Some(ip) = config.advertise_ip {
        log::info!("Configuration: port={}, advertise_ip={}", config.port, ip);
        Arc::new(StaticIpDetector::new(ip))
    } else {
        log::info!("Configuration: port={}, advertise_ip=auto", config.port);
        LocalIpDetector::arc()
    };

    let catalog = DirectoryCatalog::scan(&media_dir, config.recursive)
        .with_context(|| format!("Failed to scan media directory: {}", media_dir.display()))?;
    log::info!(
        "Serving {} song(s) from {}",
        catalog.len(),
        catalog.root().display()
    );

    let server = MediaServer::new(
        config.to_core_config(),
        Arc::new(catalog),
        Arc::new(LocalFileAccess::new()),
        detector,
    );

    let url = server.start().await.context(
        "Failed to start server. \
         If no LAN address was found, pass --advertise-ip with an address \
         other devices can reach.",
    )?;
    log::info!("Streaming at {}/song/{{id}}", url);

    // Wait for shutdown signal
    shutdown_signal().await;

    log::info!("Shutdown signal received, cleaning up...");
    server.stop().await;

    log::info!("Shutdown complete");
    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
