//! `shadow-rpc`: load settings, connect to Discord, serve `/update_rpc` until ctrl+c.
//!
//! Discord does not have to be running at start; the sink connects on the
//! first update that finds it.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use shadow_core::{Dispatcher, LogSink, PresenceSink, TracingPresenceSink};
use shadow_discord::DiscordIpcSink;
use shadow_logging::{FanoutLogSink, MemoryLogSink, TracingLogSink};
use shadow_server::{Listener, ListenerConfig};
use shadow_settings::ShadowSettings;

/// Relay rich presence updates from `POST /update_rpc` to Discord.
#[derive(Debug, Parser)]
#[command(name = "shadow-rpc", version)]
struct Cli {
    /// Settings file (default `~/.shadow-rpc/settings.json`).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Loopback host to bind.
    #[arg(long)]
    host: Option<String>,
    /// Port to bind.
    #[arg(long)]
    port: Option<u16>,
    /// Discord application id.
    #[arg(long)]
    client_id: Option<String>,
    /// Log filter, e.g. `debug` or `shadow_server=trace`.
    #[arg(long)]
    log_level: Option<String>,
    /// Log updates instead of sending them to Discord.
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn apply(&self, settings: &mut ShadowSettings) {
        if let Some(host) = &self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(client_id) = &self.client_id {
            settings.discord.client_id.clone_from(client_id);
        }
        if let Some(level) = &self.log_level {
            settings.logging.level.clone_from(level);
        }
    }
}

fn load(cli: &Cli) -> anyhow::Result<ShadowSettings> {
    let mut settings = match &cli.config {
        Some(path) => shadow_settings::load_settings_from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => shadow_settings::load_settings().context("loading settings")?,
    };
    cli.apply(&mut settings);
    settings.validate()?;
    Ok(settings)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = load(&cli)?;
    shadow_logging::init_subscriber(&settings.logging.level);

    let history = Arc::new(MemoryLogSink::new(settings.logging.history_capacity));
    let log: Arc<dyn LogSink> = Arc::new(
        FanoutLogSink::new()
            .with(history.clone())
            .with(Arc::new(TracingLogSink)),
    );

    let discord = if cli.dry_run {
        tracing::warn!("dry run: updates will not reach discord");
        None
    } else {
        let discord = Arc::new(DiscordIpcSink::new(&settings.discord));
        match discord.connect().await {
            Ok(()) => log.append("Shadow RPC connected."),
            Err(e) => tracing::warn!(error = %e, "discord not reachable yet, connecting on first update"),
        }
        Some(discord)
    };
    let sink: Arc<dyn PresenceSink> = match &discord {
        Some(discord) => discord.clone(),
        None => Arc::new(TracingPresenceSink),
    };

    let listener = Listener::new(
        ListenerConfig::from(&settings.server),
        Dispatcher::new(sink),
        log.clone(),
    );
    let addr = listener.start().await.context("starting listener")?;
    tracing::info!(%addr, "shadow rpc ready");

    tokio::signal::ctrl_c()
        .await
        .context("waiting for ctrl+c")?;

    tracing::info!("shutting down");
    listener.stop().await;
    if let Some(discord) = discord {
        if let Err(e) = discord.disconnect().await {
            tracing::warn!(error = %e, "discord disconnect failed");
        }
    }

    let history_file = settings
        .logging
        .history_path
        .unwrap_or_else(shadow_settings::history_path);
    match history.write_to(&history_file) {
        Ok(()) => tracing::info!(
            path = %history_file.display(),
            lines = history.lines().len(),
            dropped = history.dropped(),
            "log history saved"
        ),
        Err(e) => tracing::warn!(path = %history_file.display(), error = %e, "failed to save log history"),
    }
    Ok(())
}
