//! Sentient entry point: brain, kernel, or both in one process.

mod cli;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use sentient_action::bridge::{ActionBridge, HttpBridge, LocalBridge};
use sentient_action::executor::desktop::{Desktop, HeadlessDesktop, SystemDesktop};
use sentient_action::executor::Executor;
use sentient_action::sweeper::Sweeper;
use sentient_api::auth::{load_or_generate_token, read_token};
use sentient_api::{brain_router, kernel_router, serve, BrainState, KernelState};
use sentient_core::config::SentientConfig;
use sentient_core::error::SentientError;

use crate::cli::{CliArgs, Command};

fn init_tracing(config: &SentientConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();
}

fn build_executor(config: &SentientConfig, headless: bool) -> Arc<Executor> {
    let (width, height) = (config.kernel.screen_width, config.kernel.screen_height);
    let desktop: Arc<dyn Desktop> = if headless {
        tracing::info!("Headless desktop: actions are recorded, not performed");
        Arc::new(HeadlessDesktop::new(width, height))
    } else {
        Arc::new(SystemDesktop::new(
            (width, height),
            Duration::from_millis(config.kernel.type_interval_ms),
        ))
    };
    Arc::new(Executor::new(config, desktop))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

async fn run_kernel(config: &SentientConfig, executor: Arc<Executor>) -> Result<(), SentientError> {
    let token = if config.kernel.require_token {
        let path = config.kernel.resolve_token_path(&config.general);
        Some(load_or_generate_token(&path))
    } else {
        tracing::warn!("Kernel token check disabled");
        None
    };

    let addr = format!("{}:{}", config.kernel.host, config.kernel.port);
    let router = kernel_router(KernelState::new(executor, token));
    serve(&addr, router, shutdown_signal()).await
}

async fn run_brain(config: SentientConfig, bridge: Arc<dyn ActionBridge>) -> Result<(), SentientError> {
    let addr = format!("{}:{}", config.brain.host, config.brain.port);
    let sweep_interval = Duration::from_secs(config.confirmation.sweep_interval_secs);
    let state = BrainState::new(config, bridge);

    let sweeper = Arc::new(Sweeper::new(Arc::clone(&state.orchestrator), sweep_interval));
    let sweeper_task = {
        let sweeper = Arc::clone(&sweeper);
        tokio::spawn(async move { sweeper.run().await })
    };

    let pool = Arc::clone(&state.pool);
    let served = serve(&addr, brain_router(state), shutdown_signal()).await;

    sweeper.shutdown();
    if let Err(e) = sweeper_task.await {
        tracing::warn!(error = %e, "Sweeper task ended abnormally");
    }
    pool.stop().await;
    served
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let mut config = SentientConfig::load_or_default(&config_file);
    args.apply_overrides(&mut config);

    init_tracing(&config);
    tracing::info!("Starting Sentient v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    match args.command {
        Command::Brain { .. } => {
            let token_path = config.kernel.resolve_token_path(&config.general);
            let token = read_token(&token_path);
            if token.is_none() {
                tracing::warn!(path = %token_path.display(), "No kernel token found; requests will be unauthenticated");
            }
            let bridge = HttpBridge::from_config(&config.brain, token)?;
            tracing::info!(kernel = %bridge.endpoint(), "Brain bridge ready");
            run_brain(config, Arc::new(bridge)).await?;
        }
        Command::Kernel { headless, .. } => {
            let executor = build_executor(&config, headless);
            run_kernel(&config, executor).await?;
        }
        Command::Standalone { headless } => {
            let executor = build_executor(&config, headless);
            let bridge = Arc::new(LocalBridge::new(Arc::clone(&executor)));
            let kernel_config = config.clone();
            tokio::try_join!(
                run_kernel(&kernel_config, executor),
                run_brain(config, bridge)
            )?;
        }
    }

    tracing::info!("Sentient stopped");
    Ok(())
}
