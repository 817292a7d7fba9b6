use std::{io::IsTerminal, process, sync::Arc, time::Duration};

use anyhow::Result;
use clap::{Parser, Subcommand};
use client_core::{ClientEvent, HttpSquaresApi, SquaresClient, SyncError};
use shared::domain::Square;
use tokio::sync::broadcast;
use tracing::info;
use url::Url;

mod config;
mod render;

use render::RenderOptions;

#[derive(Parser, Debug)]
#[command(name = "squares", about = "Console client for a squares collection server")]
struct Args {
    /// Base URL of the squares server; overrides the config file and
    /// environment.
    #[arg(long)]
    server_url: Option<String>,
    /// Print a symbolic grid without ANSI colors.
    #[arg(long)]
    no_color: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the collection and render it once.
    Show {
        /// Place squares by their position field instead of insertion order.
        #[arg(long)]
        by_position: bool,
        /// Print the debug block under the grid.
        #[arg(long)]
        debug: bool,
    },
    /// Create one square on the server, then render.
    Add,
    /// Delete every square, then render.
    Clear,
    /// Poll the server and re-render whenever the collection changes.
    Watch {
        /// Seconds between polls.
        #[arg(long, default_value_t = 2)]
        interval: u64,
        /// Place squares by their position field instead of insertion order.
        #[arg(long)]
        by_position: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
    let args = Args::parse();
    let color = !args.no_color && std::io::stdout().is_terminal();

    let mut settings = config::load_settings();
    if let Some(server_url) = args.server_url.clone() {
        settings.server_url = server_url;
    }
    if let Err(err) = Url::parse(&settings.server_url) {
        eprintln!("invalid server url {:?}: {err}", settings.server_url);
        process::exit(2);
    }

    let api = Arc::new(HttpSquaresApi::new(settings.server_url.clone()));
    let client = SquaresClient::new_with_add_timeout(api, settings.add_timeout());

    match args.command {
        Command::Show { by_position, debug } => {
            let options = RenderOptions {
                color,
                by_position,
            };
            load_or_exit(&client).await;
            let snapshot = client.snapshot().await;
            print!("{}", render::render_grid(&snapshot.squares, &options));
            if debug {
                print!("{}", render::render_debug(&snapshot.squares, by_position));
            }
        }
        Command::Add => {
            let options = RenderOptions {
                color,
                by_position: false,
            };
            load_or_exit(&client).await;
            if let Err(err) = client.add().await {
                exit_with_sync_error(err);
            }
            let snapshot = client.snapshot().await;
            print!("{}", render::render_grid(&snapshot.squares, &options));
        }
        Command::Clear => {
            let options = RenderOptions {
                color,
                by_position: false,
            };
            load_or_exit(&client).await;
            if let Err(err) = client.clear().await {
                exit_with_sync_error(err);
            }
            let snapshot = client.snapshot().await;
            print!("{}", render::render_grid(&snapshot.squares, &options));
        }
        Command::Watch {
            interval,
            by_position,
        } => {
            let options = RenderOptions {
                color,
                by_position,
            };
            run_watch(&client, Duration::from_secs(interval), &options).await;
        }
    }

    client.close();
    Ok(())
}

async fn load_or_exit(client: &SquaresClient) {
    if let Err(err) = client.load().await {
        exit_with_sync_error(err);
    }
}

fn exit_with_sync_error(err: SyncError) -> ! {
    match err.report() {
        Some(report) => eprint!("{}", render::render_report(&report)),
        None => eprintln!("{err}"),
    }
    process::exit(1);
}

/// Reload on an interval and re-render when the collection changed.
/// Failed polls print their report and keep watching; Ctrl-C closes the
/// client and exits cleanly.
async fn run_watch(client: &Arc<SquaresClient>, interval: Duration, options: &RenderOptions) {
    let mut events = client.subscribe_events();
    let mut shown: Option<Vec<Square>> = None;

    refresh(client, &mut events, &mut shown, options).await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                client.close();
                info!("watch: interrupted, shutting down");
                break;
            }
            _ = tokio::time::sleep(interval) => {
                refresh(client, &mut events, &mut shown, options).await;
            }
        }
    }
}

async fn refresh(
    client: &SquaresClient,
    events: &mut broadcast::Receiver<ClientEvent>,
    shown: &mut Option<Vec<Square>>,
    options: &RenderOptions,
) {
    if let Err(err) = client.load().await {
        match err.report() {
            Some(report) => eprint!("{}", render::render_report(&report)),
            None => eprintln!("{err}"),
        }
        return;
    }
    while let Ok(event) = events.try_recv() {
        if let ClientEvent::CollectionReplaced { squares } = event {
            if shown.as_ref() != Some(&squares) {
                print!("{}", render::render_grid(&squares, options));
                *shown = Some(squares);
            }
        }
    }
}
