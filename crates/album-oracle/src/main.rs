//! Download oracle for the album driver.
//!
//! `GET /` answers how many files the browser has finished downloading into
//! the watched folder, or `dip` while a partial download exists.
//! `POST /debug|/info|/warning|/error` records a log line sent by the driver.

mod folder;
mod http;

use album_proto::config::Config;
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Parser)]
#[command(name = "album-oracle", about = "Counts finished downloads for album-dl")]
struct Args {
    /// Port to listen on (overrides the config file).
    #[arg(long)]
    port: Option<u16>,
    /// Address to bind (overrides the config file).
    #[arg(long)]
    bind: Option<String>,
    /// Folder to watch (overrides the config file).
    #[arg(long)]
    watch_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = Config::load()?;
    if let Some(port) = args.port {
        config.oracle.port = port;
    }
    if let Some(bind) = args.bind {
        config.oracle.bind_address = bind;
    }
    if let Some(dir) = args.watch_dir {
        config.oracle.watch_dir = dir;
    }

    std::fs::create_dir_all(&config.oracle.log_dir)
        .with_context(|| format!("creating {}", config.oracle.log_dir.display()))?;
    let log_path = config
        .oracle
        .log_dir
        .join(format!("{}.log", chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")));
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(log_file)
                .with_ansi(false)
                .with_target(false),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,album_oracle=debug")),
        )
        .init();

    info!("Log file: {:?}", log_path);
    info!("Config loaded from: {:?}", Config::config_path());
    let folder = folder::DownloadFolder::new(
        config.oracle.watch_dir.clone(),
        config.oracle.partial_suffixes.clone(),
    );
    info!("Watching {:?}", folder.dir());
    let app = http::router(folder, config.oracle.echo_level);
    http::serve(&config.oracle.bind_address, config.oracle.port, app).await
}
