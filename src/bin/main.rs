//! container-dns binary entry point.

use clap::Parser;
use container_dns::{telemetry, Config, ContainerDns, Shutdown};
use std::path::PathBuf;
use tracing::{error, info};

/// Publish DNS records for the containers running on this host.
#[derive(Parser, Debug)]
#[command(name = "container-dns")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML). Missing file means defaults.
    #[arg(short, long, default_value = "container-dns.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config: Config = config::Config::builder()
        .add_source(config::File::from(args.config.clone()).required(false))
        .add_source(
            config::Environment::with_prefix("CONTAINER_DNS")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;

    telemetry::init(&config.telemetry).map_err(|e| e as Box<dyn std::error::Error>)?;

    info!(
        config_file = %args.config.display(),
        docker_host = config.runtime.docker_host.as_deref().unwrap_or("local defaults"),
        "Starting container-dns"
    );

    let (shutdown, signals) = Shutdown::new_signals();
    tokio::spawn(signals);

    let service = ContainerDns::new(config);
    let result = service.run(shutdown).await;

    telemetry::shutdown();

    if let Err(e) = result {
        error!("container-dns error: {}", e);
        return Err(e.into());
    }

    info!("container-dns shutdown complete");
    Ok(())
}
