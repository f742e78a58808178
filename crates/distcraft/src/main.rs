//! Distcraft node entry point.
//!
//! Wires CLI flags, the TOML configuration file and logging together, then
//! runs the core on a current-thread runtime: one reactor thread owns every
//! socket readiness notification.

use anyhow::Context;
use clap::Parser;
use distcraft_core::DistCore;
use tracing::{error, info};

mod cli;
mod config;
mod logging;
mod signals;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    logging::setup_logging(&args)?;

    let mut app_config = config::AppConfig::load_from_file(&args.config).await?;
    app_config.apply_args(&args);
    let server_config = app_config.to_server_config();
    server_config.validate().context("invalid configuration")?;

    info!(port = server_config.port, "starting distcraft node");
    let core = DistCore::new(server_config);

    // Liveness probe every node answers; everything else comes from
    // plugins registering their own handlers.
    core.register_event_handler("ping", |source, args| {
        if let Some(peer) = source.connection() {
            peer.send_event("pong", args.to_vec());
        }
    });

    let server = tokio::spawn(core.clone().listen());

    tokio::select! {
        result = server => {
            result.context("server task failed")??;
        }
        signal = signals::shutdown_signal() => {
            if let Err(e) = signal {
                error!(error = %e, "signal handling failed");
            }
            info!("shutting down");
            core.shutdown();
        }
    }

    Ok(())
}
