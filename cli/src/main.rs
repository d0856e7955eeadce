use anyhow::Result;
use clap::Parser;
use dotenvy::dotenv;
use edutrack_core::config::{ApiConfig, EduTrackConfig, SessionConfig};
use edutrack_core::{get_default_config_file, ApiClient, EduTrackApi, APP_NAME};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

mod app;
mod cli;
mod logging;
mod output;

use crate::app::App;
use crate::cli::Args;

/// Resolves configuration: defaults, then the config file, then `EDUTRACK_*`
/// variables, then command-line flags.
fn load_config(args: &Args) -> Result<EduTrackConfig> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => get_default_config_file(APP_NAME)?,
    };
    let from_file = EduTrackConfig::load_from_file(&path)?;

    let from_flags = EduTrackConfig {
        log_level: args.log_level.clone(),
        api: ApiConfig {
            base_url: args.api_url.clone(),
            timeout_secs: None,
        },
        session: SessionConfig {
            path: args.session_file.clone(),
        },
    };

    Ok(from_file
        .apply_env(|key| std::env::var(key).ok())
        .merge(&from_flags))
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    logging::init(config.log_level.as_deref().unwrap_or("info"));
    debug!("Using API at {}", config.base_url());

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling request");
            on_interrupt.cancel();
        }
    });

    let client = ApiClient::from_config(&config)?;
    let app = App::new(EduTrackApi::with_cancellation(client, cancel), args.json);
    app.run(args.command).await
}

#[tokio::main]
async fn main() -> ExitCode {
    // Variables from a local .env file feed the EDUTRACK_* overrides
    dotenv().ok();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&e);
            ExitCode::FAILURE
        }
    }
}
