//! Metal Volumes CLI
//!
//! ```text
//! metal-volumes volume create name=vol1 capacity=100 location_id=loc1 \
//!     flavor_name=std username=alice password=...
//! metal-volumes volume-attachment list format=json username=alice password=...
//! metal-volumes volume-flavor list username=alice password=...
//! ```
//!
//! Results go to stdout; logs and errors go to stderr.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use metal_volumes::config::default_credential_path;
use metal_volumes::engine::poller::{MAX_RETRY_COUNT, MIN_RETRY_COUNT};
use metal_volumes::{
    Engine, FileCredentialStore, HttpConfig, PasswordGrantAuthenticator, PollPolicy, ResourceKind,
    RestClient, Result,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Metal Volumes - manage volumes, attachments and flavors
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Credential file (TOML with a [credentials] table)
    #[arg(long, env = "METAL_VOLUMES_CONFIG")]
    config: Option<PathBuf>,

    /// Seconds between state refreshes while waiting on a resource
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value = "5")]
    poll_interval_secs: u64,

    /// Refreshes allowed before giving up on a resource
    #[arg(long, env = "POLL_MAX_RETRIES", default_value_t = MAX_RETRY_COUNT)]
    max_retries: u32,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value = "60")]
    http_timeout_secs: u64,

    /// Accept self-signed TLS certificates
    #[arg(long, env = "INSECURE_TLS")]
    insecure: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create, get, delete or list volumes
    Volume(OperationArgs),
    /// Create, get, delete or list volume attachments
    VolumeAttachment(OperationArgs),
    /// List volume flavors
    VolumeFlavor(OperationArgs),
}

#[derive(clap::Args, Debug)]
struct OperationArgs {
    /// create, get, delete or list
    operation: String,

    /// Operation arguments as key=value
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

impl Command {
    fn split(&self) -> (ResourceKind, &OperationArgs) {
        match self {
            Command::Volume(op) => (ResourceKind::Volume, op),
            Command::VolumeAttachment(op) => (ResourceKind::VolumeAttachment, op),
            Command::VolumeFlavor(op) => (ResourceKind::VolumeFlavor, op),
        }
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args);

    match run(&args).await {
        Ok(rendered) => {
            println!("{}", rendered);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<String> {
    let http = HttpConfig {
        timeout: Duration::from_secs(args.http_timeout_secs),
        accept_invalid_certs: args.insecure,
    };
    let poll = PollPolicy {
        interval: Duration::from_secs(args.poll_interval_secs),
        min_retry: MIN_RETRY_COUNT,
        max_retry: args.max_retries,
    };
    let config_path = args.config.clone().unwrap_or_else(default_credential_path);
    debug!("Using credential file {}", config_path.display());
    debug!(
        "Polling every {:?}, giving up after {:?}",
        poll.interval,
        poll.worst_case()
    );

    let engine = Engine::new(
        Arc::new(RestClient::new(&http)?),
        Arc::new(PasswordGrantAuthenticator::new(&http)?),
        Arc::new(FileCredentialStore::new(config_path)),
    )
    .with_poll_policy(poll);

    let (kind, op) = args.command.split();
    let response = engine
        .execute(kind.token(), &op.operation, op.args.as_slice())
        .await?;
    response.render()
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "reqwest=warn", "rustls=warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
