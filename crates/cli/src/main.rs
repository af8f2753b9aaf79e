//! RegulaAI CLI entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration**: load `~/.regulaai/config.json` (or `--config`)
//!    and overlay environment variables and flags.
//! 2. **Wire observability**: configure `tracing-subscriber` (plain or JSON)
//!    on stderr. Every span and event emitted by `sdk` and `transport` flows
//!    through this layer.
//! 3. **Construct infrastructure**: build a `RegulaClient` over a
//!    `ReqwestTransport`.
//! 4. **Dispatch** the selected subcommand and render its result.

mod config;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sdk::{
    operations, BatchScanRequest, ClientConfiguration, ClientError, LoginRequest, Operation,
    RegulaClient, ScanRequest, SiteId,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::{mask_key, CliConfig};
use crate::output::Format;

#[derive(Parser, Debug)]
#[command(name = "regulaai", version, about = "RegulaAI CLI - GDPR compliance scanning")]
struct Cli {
    #[arg(long, global = true, help = "Config file (default: ~/.regulaai/config.json)")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "API base URL (overrides config and REGULAAI_API_URL)")]
    base_url: Option<String>,
    #[arg(long, global = true, help = "Request timeout in milliseconds")]
    timeout_ms: Option<u64>,
    #[arg(short, long, global = true, help = "Log requests to stderr")]
    verbose: bool,
    #[arg(long, global = true, help = "Emit logs as JSON")]
    log_json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store an API key (and optionally a base URL) in the config file
    Auth {
        #[arg(short = 'k', long)]
        api_key: String,
        #[arg(short = 'u', long = "url")]
        url: Option<String>,
    },
    /// Log in with email and password and print the access token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "REGULAAI_PASSWORD")]
        password: String,
    },
    /// Scan a website for GDPR compliance
    Scan {
        url: String,
        #[arg(short, long)]
        persona: Option<String>,
        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
    /// Scan several websites in one request
    Batch {
        #[arg(required = true)]
        urls: Vec<String>,
        #[arg(short, long)]
        persona: Option<String>,
        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
    /// Alert integrations
    Integrations {
        #[command(subcommand)]
        command: IntegrationCommands,
    },
    /// Print the service's Prometheus metrics
    Metrics,
    /// Print the compliance badge for a site
    Badge { site_id: String },
    /// Show the effective client configuration
    Status,
}

#[derive(Subcommand, Debug)]
enum IntegrationCommands {
    /// Show which integrations are configured
    Status,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            if err
                .downcast_ref::<ClientError>()
                .is_some_and(ClientError::requires_reauthentication)
            {
                eprintln!("Hint: run 'regulaai auth --api-key <KEY>' to configure credentials.");
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let default = if verbose { "info,sdk=debug,transport=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => CliConfig::default_path()?,
    };
    let stored = CliConfig::load(&config_path)?;
    debug!(path = %config_path.display(), "Loaded CLI config");

    let client = build_client(&cli, &stored)?;

    match cli.command {
        Commands::Auth { api_key, url } => {
            let updated = CliConfig {
                base_url: url.or(cli.base_url).or(stored.base_url),
                api_key: Some(api_key),
            };
            updated.save(&config_path)?;
            println!("Authentication configured.");
            if let Some(key) = &updated.api_key {
                println!("API key: {}", mask_key(key));
            }
            if let Some(base_url) = &updated.base_url {
                println!("Base URL: {base_url}");
            }
        }
        Commands::Login { email, password } => {
            let response = client.login(&LoginRequest { email, password }).await?;
            println!("{}", response.access_token);
        }
        Commands::Scan { url, persona, format } => {
            require_auth(&client, &operations::SCAN)?;
            let request = ScanRequest { url, persona };
            let result = client.scan_website(&request).await?;
            println!("{}", output::scan(&result, format)?);
        }
        Commands::Batch { urls, persona, format } => {
            require_auth(&client, &operations::BATCH_SCAN)?;
            let request = BatchScanRequest {
                scans: urls
                    .into_iter()
                    .map(|url| ScanRequest { url, persona: persona.clone() })
                    .collect(),
            };
            let report = client.batch_scan_report(&request).await?;
            println!("{}", output::scans(&report.successes, format)?);
            if report.is_partial() {
                eprintln!("{}", output::failures(&report.failures));
            }
        }
        Commands::Integrations {
            command: IntegrationCommands::Status,
        } => {
            require_auth(&client, &operations::INTEGRATION_STATUS)?;
            let status = client.get_integration_status().await?;
            println!("{}", output::integration_status(&status));
        }
        Commands::Metrics => print!("{}", client.get_metrics().await?),
        Commands::Badge { site_id } => {
            let Some(site_id) = SiteId::new(site_id) else {
                bail!("site id must be non-empty and not \".\" or \"..\"");
            };
            println!("{}", client.get_badge(&site_id).await?);
        }
        Commands::Status => {
            println!("Base URL: {}", client.base_address());
            println!("Timeout: {}ms", client.request_timeout().as_millis());
            println!("Auth method: {}", client.auth_method());
            println!("Authenticated: {}", client.is_authenticated());
        }
    }
    Ok(())
}

fn build_client(cli: &Cli, stored: &CliConfig) -> Result<RegulaClient> {
    let mut config = ClientConfiguration::from_env();
    if std::env::var(sdk::config::BASE_ADDRESS_ENV).is_err() {
        if let Some(base_url) = &stored.base_url {
            config.base_address = base_url.clone();
        }
    }
    if let Some(base_url) = &cli.base_url {
        config.base_address = base_url.clone();
    }
    if let Some(ms) = cli.timeout_ms {
        config.request_timeout = Duration::from_millis(ms);
    }

    let client = transport::http_client(config).context("failed to initialise HTTP client")?;
    if let Some(key) = &stored.api_key {
        client.set_api_key(key.clone());
    }
    Ok(client)
}

fn require_auth(client: &RegulaClient, operation: &Operation) -> Result<()> {
    if operation.requires_auth && !client.is_authenticated() {
        bail!("No API key configured. Run 'regulaai auth' first.");
    }
    Ok(())
}
