//! Quill authentication API server binary.

use std::sync::Arc;

use clap::Parser;
use quill_core::accounts::PgAccountStore;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "quill_api_server", about = "Quill authentication API server")]
struct Args {
    /// Port to listen on. Overrides the port in `BIND_ADDR` when set.
    #[arg(long)]
    port: Option<u16>,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/quill"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(
                    "info,quill_api=debug,quill_core=debug",
                )),
        )
        .init();

    let args = Args::parse();

    // Missing secret or inconsistent expiry windows abort startup here.
    let mut config = quill_api::config::ApiConfig::from_env()?;
    config.pg_connection_url = args.database_url;
    if let Some(port) = args.port {
        let host = config
            .bind_addr
            .rsplit_once(':')
            .map_or(config.bind_addr.as_str(), |(host, _)| host);
        config.bind_addr = format!("{host}:{port}");
    }

    info!(
        bind_addr = %config.bind_addr,
        max_connections = args.max_connections,
        ttl_secs = config.token.ttl.num_seconds(),
        algorithm = ?config.token.algorithm,
        "starting quill_api_server"
    );

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&config.pg_connection_url)
        .await?;

    info!("running database migrations");
    quill_api::migrate(&pool).await?;

    let accounts = Arc::new(PgAccountStore::new(pool));
    let state = quill_api::AppState::new(config.clone(), accounts)?;
    let app = quill_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
