//! radio-playerd — the autonomous radio playout engine binary.
//!
//! **Architecture:** Advisor → Parser → Modifier chain → Scheduler
//! (per-track: Active Modifier → Process Manager → Observers).

use anyhow::Result;
use clap::Parser;
use radio_player::advisor::TimeBandAdvisor;
use radio_player::config::Config;
use radio_player::extensions::{self, ExtensionsConfig};
use radio_player::imc::Imc;
use radio_player::log_sink::RotatingLogSink;
use radio_player::procman::ExternalProcessManager;
use radio_player::scheduler::Scheduler;
use radio_player::signal::ShutdownController;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "radio-playerd")]
#[command(about = "Autonomous radio playout engine")]
#[command(version)]
struct Args {
    /// Path to the bootstrap TOML configuration file.
    #[arg(short, long, default_value = "radio-player.toml")]
    config: PathBuf,

    /// Playlist root directory (overrides config file).
    #[arg(long)]
    playlist_root: Option<PathBuf>,

    /// Control-file directory (overrides config file).
    #[arg(long)]
    control_dir: Option<PathBuf>,

    /// Free-form startup argument forwarded to the advisor and active
    /// modifier, e.g. `list:/path/to/fixed.playlist`.
    startup_arg: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(
        &args.config,
        args.playlist_root,
        args.control_dir,
        args.startup_arg,
    )
    .await?;

    let log_sink = RotatingLogSink::open(config.log_file.clone(), config.log_max_bytes)?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "radio_player=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(log_sink),
        )
        .init();

    info!("starting radio-playerd");
    info!(config = ?args.config, "configuration loaded");

    if let Err(e) = run(config).await {
        error!(error = %e, "fatal error during startup or playout");
        return Err(e);
    }

    info!("radio-playerd shut down cleanly");
    Ok(())
}

async fn run(config: Config) -> Result<()> {
    let advisor = Arc::new(TimeBandAdvisor::new(
        config.playlist_root.clone(),
        config.bands,
        config.override_list_file(),
    ));
    advisor.ensure_directory_layout()?;

    let procman = Arc::new(ExternalProcessManager::new(
        config.decoder_program.clone(),
        Duration::from_secs(config.duration_cache_ttl_secs),
    ));

    let ext_config = ExtensionsConfig::load(&config.extensions_file).await;
    let imc = Imc::new();
    let built = extensions::build(&ext_config, &config, procman.clone(), &imc).await?;

    let shutdown = ShutdownController::new();
    shutdown.spawn_listener();

    let scheduler = Scheduler::new(
        config,
        built.advisor,
        built.active_modifier,
        procman,
        built.playlist_modifiers,
        built.observers,
        shutdown,
    );

    scheduler.run().await?;
    Ok(())
}
