use clap::Parser;
use relink_core::RelinkConfig;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use relink_server::backend::Backend;
use relink_server::{http, server};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "relink.toml")]
    config: String,

    /// Check database connectivity and exit
    #[arg(long)]
    health: bool,

    /// Create the schema, register the link types and exit
    #[arg(long)]
    setup: bool,

    /// Run against an in-memory catalog instead of Postgres
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience — production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match RelinkConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging: RUST_LOG wins, then the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.service.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let backend = if args.memory {
        if args.health || args.setup {
            eprintln!("--health and --setup require the Postgres backend");
            std::process::exit(1);
        }
        tracing::warn!("Running with the in-memory catalog; nothing will be persisted");
        Backend::memory()
    } else {
        // Connect to DB
        let pool = match relink_core::db::create_pool(&config.database).await {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Failed to connect to database: {}", e);
                std::process::exit(1);
            }
        };

        if args.setup {
            match relink_core::setup::ensure_schema(&pool).await {
                Ok(()) => println!("✅ Schema ready"),
                Err(e) => {
                    println!("❌ Schema setup failed: {}", e);
                    std::process::exit(1);
                }
            }
            match relink_core::setup::register_link_types(&pool).await {
                Ok(()) => println!("✅ Link types registered"),
                Err(e) => {
                    println!("❌ Link type registration failed: {}", e);
                    std::process::exit(1);
                }
            }
            return Ok(());
        }

        if args.health {
            match relink_core::db::health_check(&pool).await {
                Ok(v) => println!("✅ PostgreSQL connected: {}", v),
                Err(e) => {
                    println!("❌ PostgreSQL connection failed: {}", e);
                    std::process::exit(1);
                }
            }

            match relink_core::db::check_link_types(&pool).await {
                Ok(n) => println!("✅ Registered link types: {}", n),
                Err(e) => {
                    println!("❌ Link type check failed (run --setup?): {}", e);
                    std::process::exit(1);
                }
            }

            println!("✅ Relink DB health check passed");
            return Ok(());
        }

        Backend::postgres(pool)
    };

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    // Spawn HTTP REST API server if enabled
    if config.http.enabled {
        let http_backend = backend.clone();
        let http_config = config.clone();
        let http_shutdown = tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = http::start_http_server(http_backend, http_config, http_shutdown).await
            {
                tracing::error!("HTTP server error: {}", e);
            }
        });
    }

    let socket_path = config.service.socket_path.clone();
    server::run_unix_server(&socket_path, backend, tx.subscribe()).await?;

    Ok(())
}
