//! ServerBuilder for fluent API to build the HTTP server

use super::handlers::AppState;
use super::router::{build_health_routes, build_order_routes};
use crate::config::{AppConfig, Environment};
use crate::core::query::DEFAULT_PAGE_SIZE;
use crate::core::registry::ConnectionRegistry;
use crate::core::service::OrderService;
use anyhow::{Result, anyhow};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builder for the order router HTTP server
///
/// # Example
///
/// ```ignore
/// let registry = ConnectionRegistry::new()
///     .with_branch(BranchId::new(1), InMemoryBranch::new(), DEFAULT_COLLECTION)?;
///
/// let app = ServerBuilder::new()
///     .with_registry(registry)
///     .with_environment(Environment::Development)
///     .build()?;
/// ```
pub struct ServerBuilder {
    registry: Option<Arc<ConnectionRegistry>>,
    environment: Environment,
    default_page_size: u64,
    cors_permissive: bool,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            registry: None,
            environment: Environment::default(),
            default_page_size: DEFAULT_PAGE_SIZE,
            cors_permissive: false,
            custom_routes: Vec::new(),
        }
    }

    /// Set the branch connection registry (required)
    pub fn with_registry(mut self, registry: ConnectionRegistry) -> Self {
        self.registry = Some(Arc::new(registry));
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_default_page_size(mut self, page_size: u64) -> Self {
        self.default_page_size = page_size;
        self
    }

    /// Allow cross-origin requests from any origin
    pub fn with_permissive_cors(mut self, enabled: bool) -> Self {
        self.cors_permissive = enabled;
        self
    }

    /// Apply the server-level settings of an [`AppConfig`]
    ///
    /// Branch connections are not created here; see [`in_memory_registry`]
    /// and `connect_registry`.
    pub fn with_config(self, config: &AppConfig) -> Self {
        self.with_environment(config.environment)
            .with_default_page_size(config.default_page_size)
            .with_permissive_cors(config.cors_permissive)
    }

    /// Add custom routes to the server
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the handler state
    pub fn build_state(&self) -> Result<AppState> {
        let registry = self
            .registry
            .clone()
            .ok_or_else(|| anyhow!("ConnectionRegistry is required. Call .with_registry()"))?;

        if registry.branch_ids().is_empty() {
            return Err(anyhow!("ConnectionRegistry has no branches"));
        }

        let service = OrderService::new(registry).with_default_page_size(self.default_page_size);
        Ok(AppState::new(service, self.environment))
    }

    /// Build the final router
    ///
    /// This generates:
    /// - Health check routes
    /// - Order routes for every registered branch
    /// - Custom routes
    pub fn build(mut self) -> Result<Router> {
        let state = self.build_state()?;

        let mut app = build_health_routes().merge(build_order_routes(state));
        for custom_router in std::mem::take(&mut self.custom_routes) {
            app = app.merge(custom_router);
        }

        let app = app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));
        if self.cors_permissive {
            Ok(app.layer(CorsLayer::permissive()))
        } else {
            Ok(app)
        }
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self, addr: &str) -> Result<()> {
        let environment = self.environment;
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!(addr = %addr, environment = ?environment, "Server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry of empty in-memory branches, one per configured branch
#[cfg(feature = "in-memory")]
pub fn in_memory_registry(config: &AppConfig) -> Result<ConnectionRegistry> {
    use crate::core::branch::BranchId;
    use crate::storage::InMemoryBranch;

    let mut registry = ConnectionRegistry::new();
    for branch in &config.branches {
        registry.register(
            BranchId::new(branch.id),
            Arc::new(InMemoryBranch::new()),
            branch.collection.clone(),
        )?;
    }
    Ok(registry)
}

/// Create one MongoDB client per configured branch
///
/// Clients connect lazily, so an unreachable branch does not prevent startup;
/// its requests fail with a connection error until it comes back.
#[cfg(feature = "mongodb_backend")]
pub async fn connect_registry(config: &AppConfig) -> Result<ConnectionRegistry> {
    use crate::core::branch::BranchId;
    use crate::storage::MongoBranch;

    let mut registry = ConnectionRegistry::new();
    for branch in &config.branches {
        if branch.uri.trim().is_empty() {
            return Err(anyhow!(
                "Branch {} has no connection string (set MONGO_URI_BRANCH{})",
                branch.id,
                branch.id
            ));
        }
        let connection = MongoBranch::connect(&branch.uri, branch.database.as_deref()).await?;
        registry.register(
            BranchId::new(branch.id),
            Arc::new(connection),
            branch.collection.clone(),
        )?;
        tracing::info!(branch = branch.id, collection = %branch.collection, "branch client created");
    }
    Ok(registry)
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
