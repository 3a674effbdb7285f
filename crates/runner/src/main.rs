mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use groupforge_core::metrics::encode_metrics;
use groupforge_core::{
    load_accounts, load_config, validate_config, CapGuruSolver, ChallengeSolver,
    ContentGenerator, FleetOrchestrator, OpenAiGenerator, Pacer, PlatformConnector,
    SanitizedConfig, VkConnector,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable naming the config file when no argument is given.
const CONFIG_ENV: &str = "GROUPFORGE_CONFIG";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // The subscriber may not be installed yet.
        eprintln!("Fatal error: {:#}", e);
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config_path = config_path(std::env::args().nth(1), std::env::var(CONFIG_ENV).ok());

    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    logging::init(&config.output.logs_dir).context("Failed to initialize logging")?;

    info!("groupforge {} starting", VERSION);
    info!("Configuration loaded from {:?}", config_path);
    info!(
        "Effective configuration: {}",
        serde_json::to_string(&SanitizedConfig::from(&config))?
    );

    let accounts = load_accounts(&config.input.path)
        .with_context(|| format!("Failed to load accounts from {:?}", config.input.path))?;
    let requests: usize = accounts.iter().map(|a| a.groups.len()).sum();
    info!(
        "Loaded {} accounts with {} group requests",
        accounts.len(),
        requests
    );

    let cancel = CancellationToken::new();
    let pacer = Pacer::new(cancel.clone());

    let generator: Arc<dyn ContentGenerator> = Arc::new(
        OpenAiGenerator::new(config.generator.clone())
            .context("Failed to create generation client")?,
    );
    info!("Using generation API at {}", config.generator.api_base);

    let solver: Arc<dyn ChallengeSolver> = Arc::new(
        CapGuruSolver::new(&config.solver, &config.output.temp_dir, pacer.clone())
            .context("Failed to create challenge solver")?,
    );
    info!("Using challenge solver at {}", config.solver.base_url);

    let connector: Arc<dyn PlatformConnector> =
        Arc::new(VkConnector::new(config.platform.clone()));

    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Shutdown requested, stopping after current steps");
        cancel.cancel();
    });

    let report = FleetOrchestrator::new(accounts, connector, generator, solver, &config, pacer)
        .run()
        .await;
    info!("Run summary: {}", serde_json::to_string(&report.total())?);

    if let Some(path) = &config.output.metrics_path {
        let text = encode_metrics().context("Failed to encode metrics")?;
        tokio::fs::write(path, text)
            .await
            .with_context(|| format!("Failed to write metrics to {:?}", path))?;
        info!("Metrics written to {:?}", path);
    }

    Ok(())
}

/// First CLI argument, else the environment variable, else `config.toml`.
fn config_path(arg: Option<String>, env: Option<String>) -> PathBuf {
    arg.or(env)
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
