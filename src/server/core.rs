use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::get;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;

use crate::config::ServerConfig;
use crate::error::FileDropError;
use crate::server::handlers;
use crate::server::responses::error_envelope;
use crate::server::urls::UrlBuilder;
use crate::storage::ExtensionPolicy;

/// Shared, read-only state handed to every request
#[derive(Debug, Clone)]
pub struct AppState {
    pub root: Arc<PathBuf>,
    pub policy: Arc<ExtensionPolicy>,
    pub urls: Arc<UrlBuilder>,
}

impl AppState {
    pub fn new(config: &ServerConfig, root: PathBuf) -> Self {
        Self {
            root: Arc::new(root),
            policy: Arc::new(config.extension_policy()),
            urls: Arc::new(UrlBuilder::new(
                config.public_url.clone(),
                config.socket_addr(),
            )),
        }
    }
}

/// Builds the router with every route and layer attached
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route(
            "/files",
            get(handlers::list_files).post(handlers::upload_files),
        )
        .route(
            "/files/",
            get(handlers::list_files).post(handlers::upload_files),
        )
        .route(
            "/files/{*path}",
            get(handlers::get_file).delete(handlers::delete_file),
        )
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .layer(DefaultBodyLimit::max(config.max_upload_size_bytes()))
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(middleware::map_response(error_envelope))
        .layer(cors)
        .with_state(state)
}

pub struct Server {
    listener: TcpListener,
    router: Router,
    config: Arc<ServerConfig>,
}

impl Server {
    pub async fn new(config: ServerConfig) -> Result<Self, FileDropError> {
        let root = config.upload_root()?;

        if let Err(e) = std::fs::create_dir_all(&root) {
            warn!("Failed to create upload folder {}: {}", root.display(), e);
        } else {
            info!("Upload folder: {}", root.display());
        }

        let policy = config.extension_policy();
        if policy.is_restricted() {
            info!(
                "Accepting extensions: {}",
                config.supported_extensions.as_deref().unwrap_or_default()
            );
        }

        let router = build_router(AppState::new(&config, root), &config);

        let addr = config.socket_addr();
        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => {
                info!("Server bound to {}", addr);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", addr, e);
                return Err(FileDropError::from(e));
            }
        };

        Ok(Self {
            listener,
            router,
            config: Arc::new(config),
        })
    }

    pub async fn start(self) -> Result<(), FileDropError> {
        info!(
            "Starting file drop server on {} (upload limit {} MB)",
            self.config.socket_addr(),
            self.config.max_upload_size_mb
        );

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
