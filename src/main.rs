use anyhow::Result;
use integral_lens::{bootstrap, config::RuntimeConfig, http::start_http_server};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = bootstrap(&RuntimeConfig::default().log_level).map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    info!("Starting integral-lens server");
    start_http_server(&config).await
}
