use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    // Startup banner at info level so something always prints at default verbosity
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    let config = warden::config::WardenConfig::from_env();
    info!(
        target: "warden",
        "Warden starting: RUST_LOG='{}', http_port={}, acl_file='{}', persistent_dir='{}', data_dir='{}'",
        rust_log, config.http_port, config.acl_file, config.persistent_dir, config.data_dir
    );

    warden::server::run_with_config(config).await
}
