//! order-router server binary
//!
//! Usage: `order-router [config.yaml]`. The config path may also be given in
//! `ORDER_ROUTER_CONFIG`. Without one, branches 1 to 3 are configured and
//! their connection strings are read from `MONGO_URI_BRANCH{n}`.

#[cfg(not(any(feature = "in-memory", feature = "mongodb_backend")))]
compile_error!("enable at least one of the `in-memory` or `mongodb_backend` features");

use anyhow::Result;
use order_router::config::AppConfig;
use order_router::server::ServerBuilder;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("order_router=info,tower_http=info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("ORDER_ROUTER_CONFIG").ok());

    let config = match config_path {
        Some(path) => {
            tracing::info!(path = %path, "loading configuration");
            AppConfig::from_yaml_file(&path)?
        }
        None => AppConfig::default_branches(),
    }
    .apply_env();
    config.validate()?;

    #[cfg(feature = "mongodb_backend")]
    let registry = order_router::server::connect_registry(&config).await?;

    #[cfg(not(feature = "mongodb_backend"))]
    let registry = {
        tracing::warn!("built without the mongodb_backend feature, serving empty in-memory branches");
        order_router::server::in_memory_registry(&config)?
    };

    tracing::info!(
        branches = config.branches.len(),
        environment = ?config.environment,
        "order router configured"
    );

    ServerBuilder::new()
        .with_config(&config)
        .with_registry(registry)
        .serve(&config.listen_addr)
        .await
}
