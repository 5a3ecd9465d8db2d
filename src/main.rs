use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use shortvid::host::console::ConsoleEvent;
use shortvid::host::{dispatch, Star};
use shortvid::{FetcherConfig, VideoPlugin};

#[derive(Parser)]
#[command(name = "shortvid")]
#[command(about = "Random short-video chat plugin, driven from the console", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.shortvid/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the `video` command group (美女 / 随机 / 状态)
    Video {
        /// Subcommand and arguments
        args: Vec<String>,
    },
    /// Print the effective configuration
    Config,
    /// Show version information
    Version,
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("shortvid=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<FetcherConfig> {
    let mut config = match path.or_else(FetcherConfig::default_path) {
        Some(path) => FetcherConfig::load(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => FetcherConfig::default(),
    };
    config.apply_env_overrides();
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.json);

    match cli.command {
        Some(Commands::Version) | None => {
            println!("shortvid {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Config) => {
            let config = load_config(cli.config)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Some(Commands::Video { args }) => {
            let config = load_config(cli.config)?;
            let plugin = VideoPlugin::new(&config).context("failed to start video plugin")?;
            let event = ConsoleEvent::new(format!("video {}", args.join(" ")));

            tokio::select! {
                result = dispatch(&plugin, &event) => {
                    result.context("video command failed")?;
                }
                _ = tokio::signal::ctrl_c() => {
                    warn!("interrupted, abandoning in-flight request");
                }
            }

            plugin.terminate().await;
        }
    }

    Ok(())
}
