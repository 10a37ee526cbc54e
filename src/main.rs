//! `quran-collect` binary entry point

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use quran_data_collector::cli::{Cli, Commands};
use quran_data_collector::shutdown::{spawn_ctrl_c_listener, ShutdownCoordinator};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let shutdown = ShutdownCoordinator::shared();
    spawn_ctrl_c_listener(Arc::clone(&shutdown));

    match cli.command {
        Commands::Collect(args) => quran_data_collector::cli::collect::run(args, shutdown).await,
        Commands::Resources(args) => quran_data_collector::cli::resources::run(args).await,
    }
}
