use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use swarmfetch::config::{CliArgs, Config};
use swarmfetch::logging;
use swarmfetch::storage::LocalStorage;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "swarmfetch")]
#[command(about = "Chunked parallel file retrieval from seeders coordinated by a tracker")]
#[command(version)]
struct Cli {
    /// Config file (TOML, or JSON by extension)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase verbosity")]
    verbose: u8,

    #[arg(short, long, global = true, help = "Only log errors")]
    quiet: bool,

    #[command(flatten)]
    tracker: TrackerArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct TrackerArgs {
    /// Tracker host
    #[arg(long, global = true)]
    tracker_host: Option<String>,

    /// Tracker protocol port
    #[arg(long, global = true)]
    tracker_port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the tracker and its diagnostics endpoint
    Tracker {
        /// Port of the JSON diagnostics endpoint
        #[arg(long)]
        web_port: Option<u16>,
    },
    /// Share every file in a directory
    Seeder {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,

        /// Directory whose files are shared
        #[arg(short, long)]
        input_dir: Option<PathBuf>,

        /// Address to register with the tracker instead of the bound one
        #[arg(long)]
        advertise_addr: Option<String>,
    },
    /// Download one torrent
    Client {
        /// File name of the torrent
        #[arg(long)]
        name: Option<String>,

        /// Declared size in bytes
        #[arg(long)]
        size: Option<u64>,

        /// Hex SHA-256 of the whole file
        #[arg(long)]
        hash: Option<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Chunk size in bytes
        #[arg(long)]
        chunk_size: Option<u64>,

        /// Deadline for the whole download, in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

impl Cli {
    fn to_cli_args(&self) -> CliArgs {
        let mut args = CliArgs {
            config_file: self.config.clone(),
            tracker_host: self.tracker.tracker_host.clone(),
            tracker_port: self.tracker.tracker_port,
            ..Default::default()
        };
        match &self.command {
            Commands::Tracker { web_port } => {
                args.web_port = *web_port;
            }
            Commands::Seeder {
                host,
                port,
                input_dir,
                advertise_addr,
            } => {
                args.seeder_host = host.clone();
                args.seeder_port = *port;
                args.input_dir = input_dir.clone();
                args.advertise_addr = advertise_addr.clone();
            }
            Commands::Client {
                name,
                size,
                hash,
                output,
                chunk_size,
                timeout,
            } => {
                args.target_name = name.clone();
                args.target_size = *size;
                args.target_hash = hash.clone();
                args.output_file = output.clone();
                args.chunk_size = *chunk_size;
                args.timeout_secs = *timeout;
            }
        }
        args
    }
}

/// Cancel `token` on Ctrl-C.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received, shutting down");
        }
        token.cancel();
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config =
        Config::load_with_cli(&cli.to_cli_args()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let level = logging::effective_level(&config.logging.level, cli.verbose, cli.quiet)?;
    logging::setup_logging(level, cli.quiet).context("Failed to set up logging")?;
    tracing::debug!(config = ?config, "Configuration loaded");

    let shutdown = CancellationToken::new();

    match cli.command {
        Commands::Tracker { .. } => {
            cancel_on_ctrl_c(shutdown.clone());
            swarmfetch::tracker::run(&config, shutdown)
                .await
                .context("Tracker failed")?;
        }
        Commands::Seeder { .. } => {
            cancel_on_ctrl_c(shutdown.clone());
            swarmfetch::seeder::run(&config, LocalStorage::shared(), shutdown)
                .await
                .with_context(|| format!("Seeder on {} failed", config.seeder.addr()))?;
        }
        Commands::Client { .. } => {
            config
                .validate_target()
                .context("Invalid download target")?;
            swarmfetch::client::run(&config, LocalStorage::shared())
                .await
                .with_context(|| {
                    format!(
                        "Failed to download {}",
                        config.client.target.to_torrent()
                    )
                })?;
        }
    }

    Ok(())
}
