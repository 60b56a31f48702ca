//! nrgcloud - command-line front end for NRG Cloud session tokens.
//!
//! Obtains and caches the bearer token used by the NRG Cloud customer API,
//! reports its status, and prints base64 payloads for uploads.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use chrono::{Duration, Local};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use nrgcloud_core::{
    encode_file_as_base64, ApiError, CloudConfig, Config, CredentialStore, Credentials,
    SessionTokenManager, TokenCache, TokenRefresh,
};

// ============================================================================
// Constants
// ============================================================================

/// Log file name prefix inside the config directory's `logs/` folder
const LOG_FILE_PREFIX: &str = "nrgcloud.log";

#[derive(Parser)]
#[command(name = "nrgcloud", version, about = "NRG Cloud API session token manager")]
struct Cli {
    /// Token cache file (defaults to the user cache directory)
    #[arg(long, env = "NRG_TOKEN_CACHE", global = true)]
    token_cache: Option<PathBuf>,

    /// API base URL
    #[arg(long, env = "NRG_API_BASE", global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Obtain a valid session token, reusing the cached one when possible
    Token {
        #[arg(long, env = "NRG_CLIENT_ID")]
        client_id: Option<String>,

        #[arg(long, env = "NRG_CLIENT_SECRET", hide_env_values = true)]
        client_secret: Option<String>,

        /// Keep the client secret in the OS keychain for later runs
        #[arg(long)]
        save_secret: bool,

        /// Print the token itself on stdout
        #[arg(long)]
        print: bool,
    },
    /// Show whether the cached token is still valid
    Status,
    /// Delete the cached token
    Clear {
        /// Also remove the last used client's secret from the OS keychain
        #[arg(long)]
        forget_secret: bool,
    },
    /// Print a file's contents as base64
    Encode { file: PathBuf },
}

/// Initialize the tracing subscriber for logging.
/// Stderr gets `RUST_LOG` filtered output (default `warn`).
/// The log file gets everything at debug.
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match Config::config_dir() {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir.join("logs"), LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(EnvFilter::new("nrgcloud_core=debug,nrgcloud=debug"));
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_filter(filter))
        .with(file_layer)
        .init();

    guard
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Progress line for a refresh; nothing is shown when a cached token was reused
fn refresh_progress(refresh: TokenRefresh, at: &str) -> Option<String> {
    match refresh {
        TokenRefresh::Reused => None,
        TokenRefresh::Requested { obtained: true } => {
            Some(format!("{} | Requesting session token ... [OK]", at))
        }
        TokenRefresh::Requested { obtained: false } => Some(format!(
            "{} | Requesting session token ... [FAILED] | unable to get session token.",
            at
        )),
    }
}

fn format_remaining(remaining: Duration) -> String {
    let minutes = remaining.num_minutes().max(0);
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Command-line flags win over the config file, which wins over defaults
fn resolve_cloud_config(cli: &Cli, config: &Config) -> Result<CloudConfig> {
    let mut config = config.clone();
    if let Some(ref path) = cli.token_cache {
        config.token_cache_path = Some(path.clone());
    }
    if let Some(ref base_url) = cli.base_url {
        config.base_url = Some(base_url.clone());
    }
    config.cloud_config()
}

/// Fill in whatever the command line left out from the config file,
/// the keychain, or an interactive prompt.
fn resolve_credentials(
    config: &Config,
    client_id: Option<String>,
    client_secret: Option<String>,
) -> Result<Credentials> {
    let client_id = match client_id.or_else(|| config.last_client_id.clone()) {
        Some(id) => id,
        None => {
            eprint!("Client ID: ");
            io::stderr().flush()?;
            let mut line = String::new();
            io::stdin().read_line(&mut line)?;
            line.trim().to_string()
        }
    };

    let client_secret = match client_secret {
        Some(secret) => secret,
        None if !client_id.is_empty() && CredentialStore::has_credentials(&client_id) => {
            CredentialStore::get_secret(&client_id)?
        }
        None => rpassword::prompt_password("Client secret: ")?,
    };

    Ok(Credentials::new(client_id, client_secret))
}

async fn run_token(
    cloud: &CloudConfig,
    mut config: Config,
    credentials: Credentials,
    save_secret: bool,
    print: bool,
) -> Result<()> {
    if !credentials.is_complete() {
        return Err(ApiError::CredentialMissing.into());
    }

    let mut manager = SessionTokenManager::new(cloud, credentials)?;
    let refresh = manager.maintain_token().await;
    if let Some(line) = refresh_progress(refresh, &timestamp()) {
        eprintln!("{}", line);
    }

    let Some(token) = manager.session_token() else {
        anyhow::bail!("No valid session token. Check the log file for details");
    };

    if save_secret {
        let creds = manager.credentials();
        CredentialStore::store(creds.client_id(), creds.client_secret())?;
    }
    if config.last_client_id.as_deref() != Some(manager.credentials().client_id()) {
        config.last_client_id = Some(manager.credentials().client_id().to_string());
        config.save()?;
    }

    let expiry = (manager.expires_at(), manager.time_until_expiry());
    if let (Some(expires_at), Some(remaining)) = expiry {
        eprintln!(
            "Session token valid until {} ({} left)",
            expires_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
            format_remaining(remaining)
        );
    }
    if print {
        println!("{}", token);
    }
    Ok(())
}

fn run_status(cloud: &CloudConfig) -> Result<()> {
    let cache = TokenCache::new(&cloud.token_cache_path);
    match cache.load() {
        Ok(Some(token)) if token.is_valid(cloud.token_lifetime) => {
            let remaining = token
                .time_until_expiry(cloud.token_lifetime)
                .unwrap_or_else(Duration::zero);
            println!(
                "Session token valid for {} ({})",
                format_remaining(remaining),
                cache.path().display()
            );
        }
        Ok(Some(token)) => {
            println!(
                "Session token expired (issued {})",
                token.issued_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
            );
        }
        Ok(None) => println!("No cached session token"),
        Err(e) => println!("Token cache unreadable: {}", e),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = init_tracing();
    info!("nrgcloud starting");

    let config = Config::load()?;
    let cloud = resolve_cloud_config(&cli, &config)?;

    match cli.command {
        Command::Token {
            client_id,
            client_secret,
            save_secret,
            print,
        } => {
            let credentials = resolve_credentials(&config, client_id, client_secret)?;
            run_token(&cloud, config, credentials, save_secret, print).await?;
        }
        Command::Status => run_status(&cloud)?,
        Command::Clear { forget_secret } => {
            TokenCache::new(&cloud.token_cache_path).clear()?;
            println!("Cleared {}", cloud.token_cache_path.display());
            if forget_secret {
                if let Some(ref client_id) = config.last_client_id {
                    CredentialStore::delete(client_id)?;
                    println!("Removed keychain secret for {}", client_id);
                }
            }
        }
        Command::Encode { file } => {
            println!("{}", encode_file_as_base64(&file)?);
        }
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
