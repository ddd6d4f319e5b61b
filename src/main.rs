use muletrace::api::start_server;
use muletrace::core::ServerConfig;
use muletrace::metrics;
use tracing::info;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("🚀 muletrace - money-muling forensic analysis service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Initialize Prometheus metrics
    metrics::init_metrics();
    info!("📊 Metrics initialized");

    // Load configuration from environment
    let config = ServerConfig::from_env();
    info!("🌐 Listening on {}:{}", config.host, config.port);

    start_server(config).await?;
    Ok(())
}
