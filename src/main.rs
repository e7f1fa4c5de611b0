//! robot-relay
//!
//! Bridges HTTP callers (typically a browser frontend) to a robot
//! controller that speaks raw TCP.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────┐
//!                  │                 ROBOT RELAY                  │
//!   HTTP request   │  ┌────────┐   ┌──────────┐   ┌────────────┐  │
//!  ────────────────┼─▶│  http  │──▶│  relay   │──▶│    peer    │──┼──▶ TCP
//!                  │  │ server │   │ handler  │   │  exchange  │  │   robot
//!   HTTP response  │  └────────┘   └──────────┘   └────────────┘  │
//!  ◀───────────────┼── response.rs + CORS headers ◀───────────────┼───
//!                  │                                              │
//!                  │  config · observability · lifecycle          │
//!                  └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use robot_relay::config::{load_config, ConfigOverrides};
use robot_relay::http::HttpServer;
use robot_relay::lifecycle::{signals, Shutdown};
use robot_relay::observability::{logging, metrics};
use robot_relay::peer::FramingPolicy;

#[derive(Parser)]
#[command(name = "robot-relay", version)]
#[command(about = "Relay HTTP request bodies to a robot over TCP", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Robot address as host:port, overrides `peer.address`.
    #[arg(short, long)]
    peer: Option<String>,

    /// Answer with canned responses instead of contacting the robot.
    #[arg(long, conflicts_with = "no_mock")]
    mock: bool,

    /// Contact the robot even if the config file enables mock mode.
    #[arg(long)]
    no_mock: bool,

    /// Frame policy: pass-through or bracket.
    #[arg(long)]
    framing: Option<FramingPolicy>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            bind_address: self.bind.clone(),
            peer_address: self.peer.clone(),
            mock_mode: match (self.mock, self.no_mock) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            },
            framing: self.framing,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), &cli.overrides())?;

    logging::init_logging(&config.observability);

    tracing::info!("robot-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        peer = %config.peer.address,
        mock_mode = config.peer.mock_mode,
        framing = ?config.peer.framing,
        connect_ms = config.timeouts.connect_ms,
        deadline_ms = config.timeouts.deadline_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validated at load time.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
