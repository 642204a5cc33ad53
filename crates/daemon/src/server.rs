//! HTTP server serving the dashboard behind the route guard

use crate::{Result, Settings};
use axum::Router;
use folio_core::SessionStore;
use folio_http::middleware::{GuardState, route_guard_middleware};
use folio_http::routes::health;
use folio_http::{FolioClient, RouteGuard};
use tokio::net::TcpListener;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Build the dashboard router
///
/// Every page goes through the guard middleware. Paths that match no file
/// fall back to the index page so client-side routes resolve.
pub fn build_router(settings: &Settings) -> Result<Router> {
    let client = FolioClient::from_config(&settings.api, SessionStore::new())?;
    let guard = RouteGuard::new(settings.guard.clone());
    info!(
        backend = %client.base_url(),
        login = %guard.config().login_path,
        "Route guard configured"
    );
    let mut router = health::router(client.base_url());
    let state = GuardState::new(guard, client);

    let static_dir = &settings.server.static_dir;
    if static_dir.is_dir() {
        let index_path = static_dir.join(&settings.server.index_file);
        router = router
            .fallback_service(ServeDir::new(static_dir).fallback(ServeFile::new(index_path)));
    } else {
        warn!(
            static_dir = %static_dir.display(),
            "Static directory does not exist, skipping static file serving"
        );
    }

    Ok(router
        .layer(axum::middleware::from_fn_with_state(
            state,
            route_guard_middleware,
        ))
        .layer(TraceLayer::new_for_http()))
}

/// Bind the configured address and serve until Ctrl+C
pub async fn serve(settings: Settings) -> Result<()> {
    let app = build_router(&settings)?;
    let listener = TcpListener::bind(settings.server.bind_addr).await?;
    info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
