//! HTTP surface
//!
//! | Route | Auth | Handler |
//! |---|---|---|
//! | `POST /merge-clothes` | API key | [`handlers::merge_clothes`] |
//! | `POST /remove-background` | API key | [`handlers::remove_background`] |
//! | `GET /health` | none | [`handlers::health`] |

pub mod auth;
pub mod error;
pub mod handlers;

pub use auth::{authorize, extract_token, Authorized, API_KEY_HEADER};
pub use error::ApiError;

use crate::error::Result;
use crate::service::MergeService;
use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Largest JSON body accepted on any route
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static(API_KEY_HEADER),
        ])
}

/// Build the application router around a configured service
pub fn router(service: MergeService) -> Router {
    Router::new()
        .route("/merge-clothes", post(handlers::merge_clothes))
        .route("/remove-background", post(handlers::remove_background))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Bind `addr` and serve until Ctrl-C or SIGTERM
///
/// # Errors
/// - Failed to bind the listener
/// - Server I/O failure
pub async fn serve(service: MergeService, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    info!(
        addr = %local_addr,
        strategy = %service.strategy_kind(),
        target_width = service.config().target_width,
        "merge service listening"
    );
    info!("health check available at http://{}/health", local_addr);

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("merge service stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received");
}
