//! Pin gateway command line.
//!
//! Thin operator front end over `PinningGateway`: every subcommand loads
//! the configuration, runs one gateway operation and prints the result as
//! pretty JSON.
//!
//! ```text
//! pin-gateway [--config gateway.toml] check
//! pin-gateway pin-json payload.json --name report
//! pin-gateway pin-file image.png --cid-version 1 --wrap
//! pin-gateway list --limit 20
//! pin-gateway unpin <hash>
//! pin-gateway url <hash> --gateway https://ipfs.io
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};

use pin_gateway::config::{load_config, GatewayConfig};
use pin_gateway::observability::{logging, metrics};
use pin_gateway::pinning::cid;
use pin_gateway::pinning::{CidVersion, PinListQuery, PinMetadata, PinOptions, PinningGateway};

#[derive(Parser)]
#[command(name = "pin-gateway")]
#[command(about = "Resilient client for a content-pinning provider", long_about = None)]
struct Cli {
    /// TOML configuration file. Credentials may also come from the environment.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe provider credentials and reachability
    Check,
    /// Pin the JSON document in FILE
    PinJson {
        file: PathBuf,
        #[arg(long)]
        name: Option<String>,
    },
    /// Pin FILE as raw bytes
    PinFile {
        file: PathBuf,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=1))]
        cid_version: Option<u8>,
        #[arg(long)]
        wrap: bool,
    },
    /// List pinned content
    List {
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },
    /// Remove a pin
    Unpin { hash: String },
    /// Print the public gateway URL for a content identifier
    Url {
        hash: String,
        #[arg(long)]
        gateway: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    if let Commands::Url { hash, gateway } = &cli.command {
        if !cid::is_valid_content_id(hash) {
            tracing::warn!(hash = %hash, "Not a recognized content identifier");
        }
        print_json(&json!({ "url": cid::gateway_url(hash, gateway.as_deref()) }))?;
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config(cli.config.as_deref())?;
    logging::init_logging(&config.observability);
    start_metrics(&config);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "pin-gateway starting");
    let gateway = PinningGateway::from_config(&config)?;

    match cli.command {
        Commands::Check => {
            let connected = gateway.test_connection().await;
            print_json(&json!({ "connected": connected }))?;
            if !connected {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::PinJson { file, name } => {
            let text = std::fs::read_to_string(&file)?;
            let content: Value = serde_json::from_str(&text)?;
            let metadata = name.map(PinMetadata::named);
            let result = gateway.pin_json(&content, metadata.as_ref(), None).await?;
            print_json(&result)?;
        }
        Commands::PinFile {
            file,
            name,
            cid_version,
            wrap,
        } => {
            let bytes = std::fs::read(&file)?;
            let name = name.or_else(|| file_name(&file));
            let metadata = name.map(PinMetadata::named);
            let options = PinOptions {
                cid_version: cid_version.map(CidVersion::try_from).transpose()?,
                wrap_with_directory: wrap.then_some(true),
            };
            let result = gateway
                .pin_file(Some(&bytes), metadata.as_ref(), Some(&options))
                .await?;
            print_json(&result)?;
        }
        Commands::List { limit, offset } => {
            let query = PinListQuery {
                page_limit: limit,
                page_offset: offset,
                ..PinListQuery::default()
            };
            let list = gateway.list_pins_with(&query).await?;
            print_json(&list)?;
        }
        Commands::Unpin { hash } => {
            gateway.unpin(&hash).await?;
            print_json(&json!({ "unpinned": hash }))?;
        }
        Commands::Url { .. } => {}
    }

    Ok(ExitCode::SUCCESS)
}

fn start_metrics(config: &GatewayConfig) {
    if !config.observability.metrics_enabled {
        return;
    }
    match config.observability.metrics_address.parse() {
        Ok(addr) => metrics::init_metrics(addr),
        Err(_) => tracing::error!(
            metrics_address = %config.observability.metrics_address,
            "Failed to parse metrics address"
        ),
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
