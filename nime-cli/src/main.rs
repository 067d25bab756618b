//! NIME CLI
//!
//! Runs the edge API and exposes its pipelines for manual use.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use nime_api::{ApiServer, AppState, NimeConfig, DEFAULT_PORT};
use nime_crypto::{sign, WebhookSecret};

/// NIME - caching edge API for the a.ni.me desktop client
#[derive(Parser)]
#[command(name = "nime")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Bind address
        #[arg(short, long, default_value = "0.0.0.0")]
        bind: String,
    },

    /// Resolve one anime id through the cache
    Resolve {
        /// Upstream anime id
        id: String,
    },

    /// Refresh the release channels from the release index
    Sync,

    /// Print the webhook signature header for a payload file
    Sign {
        /// Webhook secret
        #[arg(short, long, env = "GITHUB_WEBHOOK_SECRET", hide_env_values = true)]
        secret: String,
        /// Payload file, signed byte for byte
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // `.env` has to be loaded before clap reads its `env` fallbacks
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "nime=debug,info"
    } else {
        "nime=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(cli.json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!cli.json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    match cli.command {
        Commands::Serve { port, bind } => cmd_serve(port, &bind).await,
        Commands::Resolve { id } => cmd_resolve(&id).await,
        Commands::Sync => cmd_sync().await,
        Commands::Sign { secret, file } => cmd_sign(&secret, &file),
    }
}

fn load_state() -> Result<AppState> {
    let config = NimeConfig::from_env();
    debug!(?config, "Loaded configuration");
    AppState::new(config).context("Failed to initialize services")
}

/// Run the API server
async fn cmd_serve(port: u16, bind: &str) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", bind, port))?;

    println!("{}", "Starting NIME API server...".cyan().bold());
    println!("   {} http://{}", "Listening on:".green(), addr);
    println!("   {} http://{}/health", "Health check:".dimmed(), addr);
    println!("\n   Press Ctrl+C to stop.\n");

    let server = ApiServer::new(load_state()?);
    server.run(addr).await?;

    Ok(())
}

/// Resolve one id through the cache-aside pipeline
async fn cmd_resolve(id: &str) -> Result<()> {
    let state = load_state()?;

    let resolved = state
        .anime
        .resolve(id)
        .await
        .with_context(|| format!("Failed to resolve anime {}", id))?;

    let source = if resolved.served_from_cache {
        "cache".green()
    } else {
        "upstream".yellow()
    };
    eprintln!("{} {}", "Served from:".dimmed(), source);
    println!("{}", serde_json::to_string_pretty(&resolved)?);

    Ok(())
}

/// Re-run release synchronization, as a webhook delivery would
async fn cmd_sync() -> Result<()> {
    println!("{}", "Syncing release channels...".cyan().bold());

    let state = load_state()?;
    let report = state
        .releases
        .refresh()
        .await
        .context("Failed to read release index")?;

    for (label, outcome) in [("latest", &report.stable), ("latest-pre", &report.prerelease)] {
        match (outcome.written_tag(), outcome.is_selected()) {
            (Some(tag), _) => println!("   {} {} -> {}", "✓".green(), label, tag),
            (None, true) => println!("   {} {} (write failed)", "✗".red(), label),
            (None, false) => println!("   {} {} (no release)", "-".dimmed(), label),
        }
    }

    if report.is_complete() {
        Ok(())
    } else {
        Err(anyhow!("One or more channels failed to store"))
    }
}

/// Print the signature header for a file
fn cmd_sign(secret: &str, file: &Path) -> Result<()> {
    println!("{}", signature_for_file(secret, file)?);
    Ok(())
}

fn signature_for_file(secret: &str, file: &Path) -> Result<String> {
    if secret.is_empty() {
        return Err(anyhow!("Webhook secret must not be empty"));
    }
    let body = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    Ok(sign(&WebhookSecret::new(secret), &body))
}
