//! Parley CLI and HTTP API entry point.
//!
//! Binary name: `parley`
//!
//! Loads configuration, initializes tracing, opens the database and wires the
//! chat service, then dispatches to a CLI command or starts the HTTP server.

mod cli;
mod http;
mod state;

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use clap_complete::generate;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use cli::{Cli, Commands};
use parley_infra::config::{config_path_for, load_config, resolve_data_dir};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need config or app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "parley", &mut std::io::stdout());
        return Ok(());
    }

    let data_dir = resolve_data_dir();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| config_path_for(&data_dir));
    let mut config = load_config(&config_path).await?;
    cli.apply_overrides(&mut config);

    parley_observe::tracing_setup::init_tracing(&config.logging)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;
    info!(config = %config_path.display(), data_dir = %data_dir.display(), "Configuration loaded");

    let state = AppState::init(config, &data_dir).await?;

    let result = match &cli.command {
        Commands::Serve { .. } => serve(state.clone()).await,
        Commands::CreateChat { user_a, user_b } => {
            cli::chat::create_chat(&state, user_a, user_b, cli.json).await
        }
        Commands::FindChat { user_a, user_b } => {
            cli::chat::find_chat(&state, user_a, user_b, cli.json).await
        }
        Commands::Chats { user_id } => cli::chat::list_chats(&state, user_id, cli.json).await,
        Commands::Send {
            chat_id,
            sender,
            content,
        } => cli::chat::send_message(&state, chat_id, sender, content, cli.json).await,
        Commands::Messages {
            chat_id,
            viewer,
            limit,
            before,
        } => {
            cli::chat::list_messages(
                &state,
                chat_id,
                viewer.as_deref(),
                *limit,
                before.as_ref(),
                cli.json,
            )
            .await
        }
        Commands::MarkRead { chat_id, user_id } => {
            cli::chat::mark_read(&state, chat_id, user_id, cli.json).await
        }
        Commands::Completions { .. } => unreachable!("handled above"),
    };

    state.db_pool.close().await;
    result
}

/// Run the HTTP server until Ctrl+C/SIGTERM, then drain in-flight requests
/// for at most `server.shutdown_timeout_secs`.
async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let shutdown_timeout = Duration::from_secs(state.config.server.shutdown_timeout_secs);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "Parley API listening");

    println!(
        "  {} Parley API listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let router = http::router::build_router(state);
    let token = CancellationToken::new();
    let shutdown = token.clone();

    let mut server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await
    });

    tokio::select! {
        () = shutdown_signal() => {}
        joined = &mut server => {
            // The server stopped on its own; surface why.
            joined??;
            return Ok(());
        }
    }

    info!(
        timeout_secs = shutdown_timeout.as_secs(),
        "Shutdown signal received, draining connections"
    );
    token.cancel();

    match tokio::time::timeout(shutdown_timeout, &mut server).await {
        Ok(joined) => joined??,
        Err(_) => {
            warn!("Graceful shutdown timed out, dropping in-flight requests");
            server.abort();
        }
    }

    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
