//! Impact Stories Server
//!
//! Serves the story collection over HTTP.

use anyhow::Context;
use clap::{Arg, ArgAction, Command};
use impact_stories::core::{create_app_state, init_logging, Config};
use impact_stories::api::start_api_server;
use tokio::signal;
use tracing::{info, warn};

// Configure global allocator
#[global_allocator]
static GLOBAL: jemallocator::Jemalloc = jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let matches = Command::new(impact_stories::NAME)
        .version(impact_stories::VERSION)
        .about("REST backend for impact stories")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
        )
        .arg(
            Arg::new("http-addr")
                .long("http-addr")
                .value_name("ADDR")
                .help("HTTP server bind address")
        )
        .arg(
            Arg::new("data-file")
                .long("data-file")
                .value_name("FILE")
                .help("JSON document holding the stories")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level or filter directives, e.g. info or impact_stories=debug")
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .action(ArgAction::SetTrue)
                .help("Fail on a malformed story document instead of treating it as empty")
        )
        .get_matches();

    // Load configuration
    let config_path = matches.get_one::<String>("config").map(String::as_str);
    let mut config = Config::load(config_path).context("loading configuration")?;

    // Apply CLI overrides
    apply_cli_overrides(&mut config, &matches)?;
    config.validate().context("validating configuration")?;

    // Initialize logging
    init_logging(&config.logging)?;
    info!("Starting {} v{}", impact_stories::NAME, impact_stories::VERSION);

    let app_state = create_app_state(config)
        .await
        .context("initializing story store")?;

    start_api_server(app_state, shutdown_signal()).await?;

    info!("Shutdown complete");
    Ok(())
}

/// Apply command line argument overrides to configuration
fn apply_cli_overrides(config: &mut Config, matches: &clap::ArgMatches) -> anyhow::Result<()> {
    if let Some(addr) = matches.get_one::<String>("http-addr") {
        config.server.http_addr = addr
            .parse()
            .with_context(|| format!("Invalid HTTP address: {}", addr))?;
    }

    if let Some(data_file) = matches.get_one::<String>("data-file") {
        config.storage.data_file = data_file.into();
    }

    if let Some(level) = matches.get_one::<String>("log-level") {
        config.logging.level = level.clone();
    }

    if matches.get_flag("strict") {
        config.storage.strict = true;
    }

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C signal");
        },
        _ = terminate => {
            warn!("Received terminate signal");
        },
    }
}
