//! morphdeck - headless host
//!
//! Drives the model described in the config file from every connected MIDI
//! controller, logging scene updates instead of drawing them.

use anyhow::Result;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use morphdeck::config::AppConfig;
use morphdeck::scene::LogScene;
use morphdeck::transport::{list_ports_formatted, MidirTransport};
use morphdeck::{console, monitor, Session};

/// morphdeck - MIDI control of morph targets, color and scale
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// List available MIDI ports
    #[arg(long)]
    list_ports: bool,

    /// Print incoming MIDI messages without routing them
    #[arg(long)]
    monitor: bool,

    /// Read widget commands from an interactive console
    #[arg(long)]
    console: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level)?;

    info!("Starting morphdeck v{}...", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = AppConfig::load_or_default(&args.config).await?;
    let transport = MidirTransport::new(config.midi.client_name.clone());

    if args.list_ports {
        let mut transport = transport;
        return list_ports_formatted(&mut transport);
    }

    if args.monitor {
        return monitor::run_monitor(transport, &config.midi, shutdown_signal()).await;
    }

    let mut session = Session::new(&config, transport, LogScene::new())?;
    let opened = session.open_devices();
    if opened == 0 {
        info!("No MIDI input opened, running on console/widgets only");
    } else {
        info!("🎹 {} MIDI input(s) open", opened);
    }
    session.load_model(&config.model);

    let console_rx = if args.console {
        let (tx, rx) = mpsc::unbounded_channel();
        console::spawn_console(tx)?;
        Some(rx)
    } else {
        None
    };

    session.run(console_rx, shutdown_signal()).await?;

    info!("morphdeck shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            // Without a handler the console or a kill is the only way out
            error!("Failed to install CTRL+C signal handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}
