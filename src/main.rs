//! Command line Nostr relay client. Manages a saved relay list, fetches
//! events matching a filter inside a bounded collection window, and signs
//! and publishes text notes from a private key.

mod config;
mod error;
mod event;
mod filter;
mod handler;
mod keys;
mod relay;
mod store;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use config::Settings;
use handler::RelayHandler;

/// Command line interface entry point.
#[derive(Parser)]
#[command(
    name = "sendstr",
    author,
    version,
    about = "Command line Nostr relay client"
)]
struct Cli {
    /// Path to the `.env` configuration file.
    #[arg(long, default_value = ".env")]
    env: String,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Manage the saved relay list.
    Relay {
        #[command(subcommand)]
        action: RelayAction,
    },
    /// Fetch events matching a filter from a relay.
    Fetch {
        /// Relay URL; defaults to the first saved relay.
        #[arg(long)]
        relay: Option<String>,
        /// Event kind to match; repeatable.
        #[arg(long = "kind")]
        kinds: Vec<u32>,
        /// Author public key (hex) to match; repeatable.
        #[arg(long = "author")]
        authors: Vec<String>,
        /// Inclusive lower bound on created_at.
        #[arg(long)]
        since: Option<u64>,
        /// Inclusive upper bound on created_at.
        #[arg(long)]
        until: Option<u64>,
        /// Maximum result count requested from the relay.
        #[arg(long)]
        limit: Option<usize>,
        /// Collection window in milliseconds.
        #[arg(long)]
        window_ms: Option<u64>,
    },
    /// Sign and publish a text note.
    Send {
        /// Relay URL; defaults to the first saved relay.
        #[arg(long)]
        relay: Option<String>,
        /// Private key, nsec or hex.
        #[arg(long)]
        key: String,
        /// Note body.
        message: String,
    },
}

/// Operations available under `sendstr relay`.
#[derive(Subcommand)]
enum RelayAction {
    /// Save a relay URL.
    Add { url: String },
    /// Remove a saved relay URL.
    Remove { url: String },
    /// Print saved relay URLs, one per line.
    List,
}

/// Execute the selected CLI subcommand.
async fn run(cli: Cli) -> anyhow::Result<()> {
    ensure_env_file(&cli.env)?;
    let cfg = Settings::from_env(&cli.env)?;
    let mut handler = RelayHandler::new(&cfg);
    match cli.command {
        Commands::Relay { action } => match action {
            RelayAction::Add { url } => {
                handler.add_relay(&url)?;
            }
            RelayAction::Remove { url } => {
                handler.remove_relay(&url)?;
            }
            RelayAction::List => {
                for url in handler.saved_relays()? {
                    println!("{url}");
                }
            }
        },
        Commands::Fetch {
            relay,
            kinds,
            authors,
            since,
            until,
            limit,
            window_ms,
        } => {
            let target = pick_relay(relay, &handler)?;
            if let Some(ms) = window_ms {
                handler.set_collect_window(Duration::from_millis(ms));
            }
            handler.connect(&target).await?;
            let spec = filter_spec(kinds, authors, since, until, limit);
            let events = handler.subscribe(&[spec]).await?;
            for ev in &events {
                println!("{}", serde_json::to_string(ev)?);
            }
        }
        Commands::Send {
            relay,
            key,
            message,
        } => {
            let target = pick_relay(relay, &handler)?;
            handler.connect(&target).await?;
            let id = handler.send_note(&key, &message).await?;
            println!("{id}");
        }
    }
    Ok(())
}

/// Assemble the loosely-typed filter spec handed to the translation boundary.
fn filter_spec(
    kinds: Vec<u32>,
    authors: Vec<String>,
    since: Option<u64>,
    until: Option<u64>,
    limit: Option<usize>,
) -> Value {
    let mut spec = serde_json::Map::new();
    if !kinds.is_empty() {
        spec.insert("kinds".into(), json!(kinds));
    }
    if !authors.is_empty() {
        spec.insert("authors".into(), json!(authors));
    }
    if let Some(s) = since {
        spec.insert("since".into(), json!(s));
    }
    if let Some(u) = until {
        spec.insert("until".into(), json!(u));
    }
    if let Some(l) = limit {
        spec.insert("limit".into(), json!(l));
    }
    Value::Object(spec)
}

/// Resolve the target relay: an explicit `--relay` wins, else the first
/// saved entry.
fn pick_relay(explicit: Option<String>, handler: &RelayHandler) -> anyhow::Result<String> {
    if let Some(url) = explicit {
        return Ok(url);
    }
    handler
        .saved_relays()?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("no saved relays; pass --relay or save one first"))
}

/// Create a default `.env` file if one is not already present at `path`.
fn ensure_env_file(path: &str) -> anyhow::Result<()> {
    let env_path = Path::new(path);
    if env_path.exists() {
        return Ok(());
    }
    if let Some(parent) = env_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let base_dir = match env_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir()?,
    };
    let relays_path = base_dir.join("relays.json");
    let mut content = String::new();
    content.push_str(&format!("RELAYS_PATH={}\n", display_path(&relays_path)));
    content.push_str(&format!("DEFAULT_RELAY={}\n", config::DEFAULT_RELAY_URL));
    content.push_str(&format!(
        "COLLECT_WINDOW_MS={}\n",
        config::DEFAULT_COLLECT_WINDOW_MS
    ));
    fs::write(env_path, content)?;
    Ok(())
}

fn display_path(path: &PathBuf) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(not(test))]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    run(cli).await
}
