//! Command-line client for a remote slave storage node.
//!
//! Reads the policy, shared secret and site settings from the environment
//! (or a `.env` file) and runs one delegated operation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use relay_auth::{Auth, HmacAuth};
use relay_models::Policy;
use relay_remote::{
    RemoteClientConfig, RemoteHandler, SettingsProvider, SiteSettings, SourceOptions,
    StorageHandler,
};

#[derive(Parser)]
#[command(name = "relay")]
#[command(about = "Delegate file operations to a remote slave node", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Slave server URL, overrides RELAY_SLAVE_SERVER
    #[arg(long, global = true)]
    server: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a signed download or preview URL
    Source {
        path: String,

        /// Seconds the URL stays valid, 0 for never
        #[arg(short, long, default_value = "3600")]
        ttl: i64,

        /// Build a download URL instead of a preview URL
        #[arg(short, long)]
        download: bool,

        /// Speed limit in bytes per second, 0 for unlimited
        #[arg(long, default_value = "0")]
        speed: u64,

        /// Display file name
        #[arg(long)]
        name: Option<String>,
    },

    /// Print a signed thumbnail URL
    Thumb { path: String },

    /// Issue an upload credential as JSON
    Token {
        /// Upload session key for the callback
        key: String,

        #[arg(short, long, default_value = "3600")]
        ttl: i64,
    },

    /// Delete files on the slave
    Delete {
        #[arg(required = true)]
        files: Vec<String>,
    },

    /// Download a file from the slave
    Get {
        path: String,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, default_value = "0")]
        speed: u64,
    },
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("relay=info,relay_remote=info,warn"));

    // Logs go to stderr so `get` can stream file content to stdout.
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let policy =
        Policy::from_env_with_server(cli.server).context("failed to load storage policy")?;

    let auth: Arc<dyn Auth> =
        Arc::new(HmacAuth::from_env().context("failed to load slave secret")?);
    let settings: Arc<dyn SettingsProvider> =
        Arc::new(SiteSettings::from_env().context("failed to load site settings")?);
    let client = RemoteClientConfig::from_env()
        .build_client()
        .context("failed to build HTTP client")?;

    let handler = RemoteHandler::new(client, &policy, auth, settings);
    info!(server = %policy.server, "Using slave node");

    match cli.command {
        Commands::Source {
            path,
            ttl,
            download,
            speed,
            name,
        } => {
            let mut options = SourceOptions::default().with_speed_limit(speed);
            if let Some(name) = name {
                options = options.with_file_name(name);
            }
            let url = handler.source(&path, ttl, download, &options).await?;
            println!("{}", url);
        }
        Commands::Thumb { path } => {
            let response = handler.thumb(&path).await?;
            println!("{}", response.url);
        }
        Commands::Token { key, ttl } => {
            let credential = handler.token(ttl, &key).await?;
            println!("{}", serde_json::to_string_pretty(&credential)?);
        }
        Commands::Delete { files } => {
            let (failed, error) = handler.delete(&files).await.into_parts();
            for file in &failed {
                println!("{}", file);
            }
            if let Some(e) = error {
                return Err(anyhow::Error::new(e)
                    .context(format!("{} of {} files not deleted", failed.len(), files.len())));
            }
            info!(files = files.len(), "All files deleted");
        }
        Commands::Get {
            path,
            output,
            speed,
        } => {
            let options = SourceOptions::default().with_speed_limit(speed);
            let body = handler.get(&path, &options).await?;
            info!(
                path = %path,
                content_type = body.content_type().unwrap_or("unknown"),
                length = body.content_length(),
                "Downloading from slave"
            );

            let mut writer: Box<dyn tokio::io::AsyncWrite + Unpin> = match &output {
                Some(file) => Box::new(
                    tokio::fs::File::create(file)
                        .await
                        .with_context(|| format!("failed to create {}", file.display()))?,
                ),
                None => Box::new(tokio::io::stdout()),
            };

            let mut written = 0u64;
            let mut stream = Box::pin(body.into_stream());
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                writer.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            writer.flush().await?;
            info!(path = %path, bytes = written, "Download finished");
        }
    }

    Ok(())
}
