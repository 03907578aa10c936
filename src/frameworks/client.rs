// Framework bootstrap for the game client runtime.

use crate::domain::ClientState;
use crate::frameworks::config::{self, ClientConfig};
use crate::interface_adapters::clients::health::HealthClient;
use crate::interface_adapters::input::{ConsoleLine, spawn_console_reader};
use crate::interface_adapters::net::{Connection, LoopSettings, NetError, run_client_loop};
use crate::interface_adapters::view::View;

use std::io::{self, Write};
use tokio::sync::{mpsc, watch};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // Logs go to stderr; stdout carries the rendered frames.
    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

fn print_frame(view: &View) {
    let mut stdout = std::io::stdout().lock();
    let _ = writeln!(stdout, "\n{}", view.to_text());
    let _ = stdout.flush();
}

// Preflight is advisory: a failing check is logged and the socket is tried anyway.
async fn preflight(config: &ClientConfig) {
    let Some(health_url) = config.health_url.as_deref() else {
        return;
    };

    let client = match HealthClient::new(health_url, config.health_timeout) {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(error = %e, "failed to initialize health client");
            return;
        }
    };

    match client.check().await {
        Ok(status) => tracing::info!(
            url = %client.url(),
            message = status.message.as_deref().unwrap_or(""),
            "server healthy"
        ),
        Err(e) => tracing::warn!(url = %client.url(), error = %e, "health check failed"),
    }
}

/// Probes health, opens the socket and drives the client loop until it ends.
///
/// The host supplies the command source, the shutdown flag and the frame sink.
pub async fn run_session<F>(
    config: &ClientConfig,
    commands: mpsc::Receiver<ConsoleLine>,
    shutdown: watch::Receiver<bool>,
    on_render: F,
) -> Result<ClientState, NetError>
where
    F: FnMut(&View),
{
    preflight(config).await;

    let connection = Connection::open(&config.server_url)
        .await
        .inspect_err(|e| {
            tracing::error!(url = %config.server_url, error = %e, "failed to connect");
        })?;
    tracing::debug!(
        client_id = %config.client_id,
        throttle_ms = config.throttle_window.as_millis(),
        render_scale = config.render_scale,
        "client configured"
    );

    let settings = LoopSettings {
        throttle_window: config.throttle_window,
        render_scale: config.render_scale,
    };
    run_client_loop(connection, commands, shutdown, settings, on_render).await
}

pub async fn run(config: ClientConfig) -> io::Result<()> {
    // Console lines flow into the client loop.
    let (console_tx, console_rx) = mpsc::channel(config::CONSOLE_CHANNEL_CAPACITY);
    let console = spawn_console_reader(console_tx);

    // Ctrl+C flips the shutdown flag so the socket is closed cleanly.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            // Hold the sender; dropping it reads as a shutdown.
            std::future::pending::<()>().await;
        }
        let _ = shutdown_tx.send(true);
    });

    let result = run_session(&config, console_rx, shutdown_rx, print_frame).await;
    console.abort();

    result.map(|_| ()).map_err(|e| {
        tracing::error!(error = %e, "client session exited with error");
        io::Error::other(e)
    })
}

pub async fn run_with_config() -> io::Result<()> {
    init_runtime();

    let config = ClientConfig::from_env()
        .inspect_err(|e| tracing::error!(error = %e, "invalid configuration"))
        .map_err(io::Error::other)?;

    run(config).await
}
