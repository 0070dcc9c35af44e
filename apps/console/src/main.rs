mod settings;

use std::{io::Write, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use node_core::{EntropySet, NodeRuntime};
use shared::{
    domain::{Action, Mode, NotificationId},
    protocol::NodeEvent,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Headless NODE dashboard: prints events, reads commands from stdin")]
struct Args {
    /// TOML config file; defaults to ./node.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    mode: Option<Mode>,
    /// Seed for reproducible whispers and gauges.
    #[arg(long)]
    seed: Option<u64>,
    /// Exit after this many seconds.
    #[arg(long)]
    run_for: Option<u64>,
    /// Print every event as a JSON line.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut config = settings::load_config(args.config.as_deref())?;
    if let Some(mode) = args.mode {
        config.initial_mode = mode;
    }
    let entropy = args
        .seed
        .map(EntropySet::from_seed)
        .unwrap_or_else(EntropySet::from_os);

    let runtime = Arc::new(
        NodeRuntime::start_with_entropy(config, entropy)
            .await
            .context("failed to start node")?,
    );
    let printer = tokio::spawn(print_events(
        BroadcastStream::new(runtime.subscribe_events()),
        args.json,
    ));

    let deadline = async {
        match args.run_for {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);
    tokio::select! {
        quit = read_commands(Arc::clone(&runtime)) => {
            // Closed stdin still lets a timed run play out.
            if !quit? && args.run_for.is_some() {
                tokio::select! {
                    _ = &mut deadline => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
        }
        _ = &mut deadline => {}
        _ = tokio::signal::ctrl_c() => {}
    }

    runtime.shutdown().await;
    printer.abort();
    println!();
    Ok(())
}

async fn print_events(mut events: BroadcastStream<NodeEvent>, json: bool) {
    let mut stdout = std::io::stdout();
    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(skipped, "console fell behind the event stream");
                continue;
            }
        };
        let rendered = if json {
            match serde_json::to_string(&event) {
                Ok(line) => Some(format!("{line}\n")),
                Err(error) => {
                    warn!(%error, "failed to encode event");
                    None
                }
            }
        } else {
            render(&event)
        };
        if let Some(text) = rendered {
            let _ = stdout.write_all(text.as_bytes());
            let _ = stdout.flush();
        }
    }
}

fn render(event: &NodeEvent) -> Option<String> {
    match event {
        NodeEvent::RevealStarted { .. } => Some("\n» ".into()),
        NodeEvent::CharRevealed { ch, .. } => Some(ch.to_string()),
        NodeEvent::NotificationRaised { notification } => Some(format!(
            "\n[toast:{:?}] {} ({})\n",
            notification.category, notification.text, notification.id
        )),
        NodeEvent::NotificationRemoved { id, reason } => {
            Some(format!("\n[toast {id} removed: {reason:?}]\n"))
        }
        NodeEvent::ModeChanged { mode } => Some(format!("\n[mode] {}\n", mode.label())),
        NodeEvent::CommandOutput { line } => Some(format!("\n{line}\n")),
        NodeEvent::ActivityLogged { entry } => {
            Some(format!("\n[{:?}] {}\n", entry.level, entry.message))
        }
        NodeEvent::WhisperAppended { .. }
        | NodeEvent::RevealCompleted { .. }
        | NodeEvent::HudUpdated { .. }
        | NodeEvent::RealmsUpdated { .. } => None,
    }
}

/// Interprets one stdin line. Returns `false` when the console should exit.
async fn handle_line(runtime: &NodeRuntime, line: &str) -> Result<bool> {
    let line = line.trim();
    let Some(directive) = line.strip_prefix(':') else {
        runtime.invoke(line).await;
        return Ok(true);
    };

    runtime.touch().await;
    let (name, argument) = directive
        .split_once(' ')
        .map(|(name, rest)| (name, rest.trim()))
        .unwrap_or((directive, ""));
    match name {
        "quit" | "q" => return Ok(false),
        "mode" if argument.is_empty() => {
            runtime.toggle_mode().await;
        }
        "mode" => {
            let mode: Mode = argument.parse().map_err(anyhow::Error::msg)?;
            runtime.switch_mode(mode).await;
        }
        "action" => {
            let action: Action = argument.parse()?;
            runtime.trigger(action).await;
        }
        "dismiss" => {
            let id: NotificationId = argument.parse().context("notification id")?;
            runtime.dismiss(id).await;
        }
        "close" => runtime.close_tray().await,
        "stop" => {
            runtime.stop_ambient().await;
        }
        "hud" => {
            println!("{}", serde_json::to_string_pretty(&runtime.hud().await)?);
            println!("{}", serde_json::to_string_pretty(&runtime.realms().await)?);
        }
        "activity" => {
            for entry in runtime.activity().await {
                println!("[{:?}] {}", entry.level, entry.message);
            }
        }
        other => anyhow::bail!("unknown directive ':{other}'"),
    }
    Ok(true)
}

/// Returns `true` when the user asked to quit, `false` when stdin closed.
async fn read_commands(runtime: Arc<NodeRuntime>) -> Result<bool> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match handle_line(&runtime, &line).await {
            Ok(true) => {}
            Ok(false) => return Ok(true),
            Err(error) => warn!(error = %format!("{error:#}"), "command rejected"),
        }
    }
    Ok(false)
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
