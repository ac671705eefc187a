//! Stubmarket CLI - command-line access to the stubmarket API.
//!
//! This is the entry point for the `stubmarket` binary.

mod commands;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use stubmarket_auth::AuthClient;
use stubmarket_client::{ApiClient, ChannelSink, Severity};
use stubmarket_store::{LocalStore, RocksStorage};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use commands::Command;
use settings::{FileConfig, Overrides, Settings};

/// Stubmarket CLI - buy, sell, and manage ticket stubs.
#[derive(Parser, Debug)]
#[command(name = "stubmarket")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// API base URL.
    #[arg(long, env = "STUBMARKET_API_URL")]
    api_url: Option<String>,

    /// Auth API base URL (defaults to the API base URL).
    #[arg(long, env = "STUBMARKET_AUTH_URL")]
    auth_url: Option<String>,

    /// Directory holding the stored session.
    #[arg(long, env = "STUBMARKET_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// JSON config file.
    #[arg(long, env = "STUBMARKET_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, default_value = "false")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let default_filter = if args.debug {
        "debug"
    } else {
        "warn,stubmarket=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let file = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(
        file,
        Overrides {
            api_url: args.api_url,
            auth_url: args.auth_url,
            state_dir: args.state_dir,
        },
    );

    std::fs::create_dir_all(&settings.state_dir)?;
    let storage = RocksStorage::open(settings.state_dir.join("session"))?;
    let store = LocalStore::new(Arc::new(storage));

    let (sink, mut notifications) = ChannelSink::channel();
    let auth = AuthClient::new(settings.client.auth_config())?;
    let api = ApiClient::builder(settings.client)
        .store(store)
        .notifier(Arc::new(sink))
        .build()?;

    tracing::debug!(api = ?api, "Client ready");

    let outcome = commands::run(&api, &auth, args.command).await;

    let mut notified = false;
    while let Ok(notification) = notifications.try_recv() {
        match notification.severity {
            Severity::Error | Severity::Warning => {
                notified = true;
                eprintln!("error: {}", notification.message);
            }
            Severity::Info | Severity::Success => eprintln!("{}", notification.message),
        }
    }

    let expired = api.auth_state().is_expired();
    if expired {
        eprintln!("Session expired. Run `stubmarket login` to sign in again.");
    }

    if finish(outcome, notified || expired)? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Whether the command succeeded. A failure the user already saw is not
/// returned again, so `main` returns normally and drops the state database.
fn finish(outcome: anyhow::Result<()>, already_shown: bool) -> anyhow::Result<bool> {
    match outcome {
        Ok(()) => Ok(true),
        Err(_) if already_shown => Ok(false),
        Err(e) => Err(e),
    }
}
