use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use forum_monitor::ai::{Classifier, WorkersAi};
use forum_monitor::config::Config;
use forum_monitor::constants::BROWSER_USER_AGENT;
use forum_monitor::db::Database;
use forum_monitor::monitor::Monitor;
use forum_monitor::notify::TelegramNotifier;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    init_tracing()?;

    info!("Starting forum-monitor");

    // Load and validate configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        feeds = config.feed_urls.len(),
        extra_urls = config.extra_urls.len(),
        only_extra = config.only_extra,
        "Configuration loaded"
    );

    if let Some(parent) = config.database_path.parent() {
        tokio::fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }

    // Initialize database
    let db = Database::new(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    info!("Database initialized");

    // One shared HTTP client: explicit timeout, browser user agent and a
    // cookie store so bot-challenge cookies survive across requests.
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .user_agent(BROWSER_USER_AGENT)
        .cookie_store(true)
        .build()
        .context("Failed to build HTTP client")?;

    let notifier = Arc::new(TelegramNotifier::new(client.clone(), &config));

    let classifier: Option<Arc<dyn Classifier>> = if config.use_ai_filter {
        info!(model = %config.ai_model, "AI filter enabled");
        Some(Arc::new(WorkersAi::new(client.clone(), &config)))
    } else {
        None
    };

    let monitor = Monitor::new(config, db, client, notifier, classifier);

    // Run the loop until a shutdown signal arrives.
    let monitor_handle = tokio::spawn(async move {
        monitor.run().await;
    });

    shutdown_signal().await;

    info!("Shutting down...");
    monitor_handle.abort();
    info!("Shutdown complete");

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,forum_monitor=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        // Structured JSON logging for production
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        // Pretty-printed logging for development
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
