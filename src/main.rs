mod ai;
mod app;
mod cli;
mod config;
mod domain;
mod infrastructure;
mod moderation;
mod storage;
mod tasks;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use infrastructure::{directories, logging, shutdown};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = config::load_config()?;
    let paths = directories::ensure_directories(&config.directories)?;
    logging::init_tracing(&config.logging, &paths.logs_dir)?;

    let shutdown = shutdown::Shutdown::new();
    shutdown::install_signal_handlers(shutdown.clone());

    let app = app::ModeratorApp::new(config, paths, shutdown);
    match cli.command {
        Command::Classify(args) => app.classify(args).await,
        Command::Check(args) => app.check(&args.path),
    }
}
