//! # Region Host
//!
//! Daemon hosting one or more regions and serving the interregion peer
//! surface.
//!
//! ```text
//! region-host --config region-host.toml
//! IR_GRID_SEND_KEY=... IR_HTTP_PORT=9000 region-host --json-logs
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use ir_06_dispatch::InterregionMode;
use node_runtime::container::LEDGER_SWEEP_INTERVAL;
use node_runtime::logging::init_logging;
use node_runtime::{HostConfig, RegionHost};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "region-host", about = "Multi-region interregion host", version)]
struct Args {
    /// Host configuration file (TOML)
    #[arg(short, long, env = "IR_CONFIG")]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// One JSON object per log line
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.json_logs)?;

    let config = HostConfig::load(args.config.as_deref()).context("loading host configuration")?;
    let bind_addr = config.bind_addr()?;
    let mode = config.communications.interregion;

    let host = RegionHost::new(config).context("starting region host")?;
    let scenes = host.register_standalone_regions()?;
    for scene in &scenes {
        info!(region = scene.name(), "Standalone scene attached");
    }
    let sweeper = host.spawn_ledger_sweeper(LEDGER_SWEEP_INTERVAL);

    if mode == InterregionMode::Local {
        info!("Local-only interregion; peer surface disabled");
        tokio::signal::ctrl_c().await?;
        host.shutdown();
    } else {
        let listener = TcpListener::bind(bind_addr)
            .await
            .with_context(|| format!("binding peer surface on {bind_addr}"))?;
        let serve = host.serve(listener);
        tokio::pin!(serve);

        tokio::select! {
            result = &mut serve => {
                if let Err(e) = result {
                    error!(error = %e, "Peer surface failed");
                    host.shutdown();
                    return Err(e.into());
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                info!("Received Ctrl+C, shutting down...");
                host.shutdown();
                serve.await?;
            }
        }
    }

    let _ = sweeper.await;
    info!("Region host shutdown complete");
    Ok(())
}
