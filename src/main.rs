use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use unraid_exporter::{
    config::{Config, Overrides},
    server, validation,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/Default.toml")]
    config: String,

    /// Unraid agent host (overrides config)
    #[arg(long, env = "UNRAID_HOST")]
    unraid_host: Option<String>,

    /// Unraid agent port (overrides config)
    #[arg(long, env = "UNRAID_PORT")]
    unraid_port: Option<u16>,

    /// Port to listen on
    #[arg(short, long, env = "EXPORTER_PORT")]
    port: Option<u16>,

    /// Address to bind to
    #[arg(short, long, env = "EXPORTER_ADDR")]
    addr: Option<String>,

    /// Check that the agent is reachable, print the entry title and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Unraid Exporter v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    // CLI arguments take precedence over file and environment
    let overrides = Overrides {
        unraid_host: args.unraid_host,
        unraid_port: args.unraid_port,
        server_addr: args.addr,
        server_port: args.port,
    };
    let config = Config::load_with(&args.config, &overrides)?;

    info!("Configuration loaded successfully");
    info!("Unraid agent: {}:{}", config.unraid.host, config.unraid.port);

    if args.validate {
        return match validation::validate_connection(&config.unraid).await {
            Ok(entry) => {
                println!("{} ({})", entry.title, entry.unique_id);
                Ok(())
            }
            Err(e) => {
                error!("Validation failed: {}", e);
                std::process::exit(1);
            }
        };
    }

    info!(
        "Metrics endpoint: http://{}:{}/metrics",
        config.server.addr, config.server.port
    );

    if let Err(e) = server::start(config).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
