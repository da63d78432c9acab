use std::path::Path;

use clap::Parser;
use tracing::info;
use video_search_proxy::server::Server;
use video_search_proxy::{logging, Config, HttpUpstream, SearchProxy};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file; defaults are used when it does not exist
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Override the listen host
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Local runs keep keys in .env; missing file is fine
    let _ = dotenvy::dotenv();
    logging::init();

    let args = Args::parse();

    let mut config = if Path::new(&args.config).exists() {
        let config = Config::from_file(&args.config)?;
        info!("Configuration loaded from {}", args.config);
        config
    } else {
        info!("No configuration file at {}, using defaults", args.config);
        Config::default()
    };
    config.apply_env(|key| std::env::var(key).ok());
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate()?;

    let proxy = SearchProxy::new(config, HttpUpstream::new()?);

    info!("Starting search proxy...");
    Server::new(proxy).run().await?;

    Ok(())
}
