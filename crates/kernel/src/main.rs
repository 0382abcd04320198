//! langcheck
//!
//! Serves text checks over HTTP, or prints the supported languages.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use langcheck_kernel::engine::LanguageRegistry;
use langcheck_kernel::engine::builtin::{BuiltinEngineFactory, BuiltinRegistry};
use langcheck_kernel::{AppState, Config, routes, xml};

#[derive(Parser)]
#[command(name = "langcheck", version, about = "Text checking over HTTP")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Main listener port (overrides PORT).
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Log the text of failed checks (overrides VERBOSE).
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Print the supported languages as XML and exit.
    Languages,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let registry = Arc::new(BuiltinRegistry::new());

    if let Some(Command::Languages) = cli.command {
        print!("{}", xml::languages_xml(&registry.languages()));
        return Ok(());
    }

    init_tracing();

    let mut config = Config::from_env().context("failed to load configuration")?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    config.verbose |= cli.verbose;
    info!(
        port = config.port,
        serialized = config.serialize_requests,
        trusted = config.trusted_addrs.len(),
        "Configuration loaded"
    );

    let state = AppState::new(&config, registry, Arc::new(BuiltinEngineFactory));

    if let Some(admin_port) = config.admin_port {
        let addr = SocketAddr::new(config.bind_addr, admin_port);
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .context("failed to bind admin address")?;
        info!(%addr, "Admin listener started");
        let admin = routes::admin(state.clone());
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, admin).await {
                tracing::error!(error = %e, "admin listener failed");
            }
        });
    }

    let addr = SocketAddr::new(config.bind_addr, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind to address")?;
    info!(%addr, "Server listening");

    let app = routes::app(state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
