// File: cbpoller-server/src/main.rs

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use cbpoller_core::handlers::Handler;
use cbpoller_core::{Error, EventClient};

mod cli;
mod config;
mod logging;
mod signals;

use cli::Args;
use config::{FileConfig, Settings};

const EXIT_FAILURE: u8 = 1;
const EXIT_AUTH: u8 = 2;

fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<Error>() {
        Some(e) if e.is_fatal_auth() => EXIT_AUTH,
        _ => EXIT_FAILURE,
    }
}

fn load_settings(args: &Args) -> anyhow::Result<Settings> {
    dotenv::dotenv().ok();

    let mut settings = Settings::default();
    if let Some(path) = args.config.as_deref() {
        let file = FileConfig::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?;
        settings = settings.merge_file(file);
    }
    let settings = settings
        .merge_env(|name| std::env::var(name).ok())
        .context("invalid environment")?;
    Ok(settings.merge_args(args))
}

/// Waits for the signal task; a panic or abort there is logged, not raised.
async fn join_listener(listener: JoinHandle<()>) -> bool {
    match listener.await {
        Ok(()) => true,
        Err(e) => {
            warn!("Signal listener task ended abnormally: {:?}", e);
            false
        }
    }
}

async fn run(settings: Settings) -> anyhow::Result<()> {
    let run_config = settings.resolve()?;
    info!(
        "cbpoller {} starting: user='{}', env={}, handler={}",
        env!("CARGO_PKG_VERSION"),
        run_config.client.username,
        run_config.client.environment.base_url(),
        run_config.handler
    );

    let handler = Handler::build(run_config.handler, run_config.influx.as_ref())
        .context("failed to build event handler")?;
    let mut client = EventClient::production(run_config.client)?;

    let shutdown = CancellationToken::new();
    let listener = signals::spawn_shutdown_listener(shutdown.clone());

    let result = client.run(&handler, shutdown.clone()).await;

    shutdown.cancel();
    join_listener(listener).await;
    result.map_err(anyhow::Error::from)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let settings = match load_settings(&args) {
        Ok(settings) => settings,
        Err(e) => {
            logging::init(args.verbose, Default::default());
            error!("Configuration error: {:#}", e);
            return ExitCode::from(EXIT_FAILURE);
        }
    };
    logging::init(settings.verbose, settings.log_format);

    match run(settings).await {
        Ok(()) => {
            info!("Shut down cleanly. Goodbye!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Fatal: {:#}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}
