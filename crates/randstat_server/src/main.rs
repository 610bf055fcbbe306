//! randstat server
//!
//! REST API for batch statistics over provider-generated random integers.

use clap::Parser;
use randstat_server::config::{build_config, CliArgs as ConfigCliArgs, Credential, Environment};
use randstat_server::server::Server;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// randstat server - standard deviation of random integer batches
#[derive(Parser, Debug)]
#[command(name = "randstat_server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (TOML format)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Host address to bind to
    #[arg(long, env = "RANDSTAT_SERVER_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "RANDSTAT_SERVER_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RANDSTAT_LOG_LEVEL")]
    log_level: Option<String>,

    /// File holding the random.org API key
    #[arg(long, value_name = "FILE", env = "RANDSTAT_API_KEY_FILE")]
    api_key_file: Option<PathBuf>,
}

impl From<Args> for ConfigCliArgs {
    fn from(args: Args) -> Self {
        ConfigCliArgs {
            config_file: args.config,
            host: args.host,
            port: args.port,
            log_level: args.log_level,
            api_key_file: args.api_key_file,
        }
    }
}

fn init_tracing(log_level: &str, environment: Environment) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if environment.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let cli_args: ConfigCliArgs = args.into();
    let config = build_config(&cli_args)?;

    init_tracing(config.log_level.as_filter_str(), config.environment);

    tracing::info!("randstat server v{}", randstat_server::VERSION);
    tracing::info!(
        host = %config.host,
        port = %config.port,
        log_level = %config.log_level,
        environment = %config.environment,
        upstream_url = %config.upstream_url,
        upstream_timeout_ms = config.upstream_timeout_ms,
        max_in_flight = config.max_in_flight,
        "Server configuration loaded"
    );

    let credential = Credential::load(&config.api_key_file);
    if credential.is_none() {
        tracing::warn!(
            path = %config.api_key_file.display(),
            "No API key loaded; /random/mean will answer 401 until one is configured"
        );
    }

    let server = Server::new(config, credential)?;
    tracing::info!(address = %server.config().socket_addr(), "Starting server");

    server.run().await?;

    Ok(())
}
