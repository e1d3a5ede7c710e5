use std::sync::Arc;

use clap::Parser;
use scholar_core::llm::{CompletionBackend, GeminiClient};
use scholar_core::store::StudyStore;
use scholar_core::ScholarConfig;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use scholar_server::router::Services;
use scholar_server::server;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "scholar.toml")]
    config: String,

    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience, production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Config before logging so the configured level can seed the filter
    let config = match ScholarConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // RUST_LOG wins over service.log_level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).init();

    // Connect to DB and apply migrations
    let pool = match scholar_core::db::connect(&config.database).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    if args.health {
        match scholar_core::db::health_check(&pool).await {
            Ok(v) => println!("✅ PostgreSQL connected: {}", v),
            Err(e) => {
                println!("❌ PostgreSQL connection failed: {}", e);
                std::process::exit(1);
            }
        }
        println!("✅ Model configured: {}", config.llm.model);
        println!("✅ Scholar health check passed");
        return Ok(());
    }

    let backend: Arc<dyn CompletionBackend> = match GeminiClient::new(config.llm.clone()) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            eprintln!("Failed to configure Gemini client: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(model = backend.model(), "Completion backend ready");

    let services = Services::new(StudyStore::new(pool), backend);

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    if config.http.enabled {
        let http_services = services.clone();
        let http_config = config.clone();
        let http_shutdown = tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = scholar_server::http::start_http_server(
                http_services,
                http_config,
                http_shutdown,
            )
            .await
            {
                tracing::error!("HTTP server error: {}", e);
            }
        });
    }

    let socket_path = config.service.socket_path.clone();
    server::run_unix_server(&socket_path, services, tx.subscribe()).await?;

    Ok(())
}
