//! Route definitions and the serve loop.

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::handlers;
use crate::state::SharedState;

/// Permissive CORS for same-network clients.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build the router for one listener.
///
/// Unmatched paths and mismatched methods both land in the 404 fallback;
/// the API has no 405 responses.
pub fn build_router(context: SharedState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/v1/models", get(handlers::list_models))
        .route("/v1/chat/completions", post(handlers::chat_completions))
        .fallback(handlers::endpoint_not_found)
        .method_not_allowed_fallback(handlers::endpoint_not_found)
        .layer(cors_layer())
        .with_state(context)
}

/// Run the server on a pre-bound listener until cancelled.
///
/// The listener is bound by the supervisor first (bind-then-report), so the
/// caller already knows the real address.
///
/// # Errors
///
/// Returns an error if the accept loop fails; clean cancellation is `Ok`.
pub async fn serve(
    listener: TcpListener,
    context: SharedState,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    let app = build_router(context);

    info!("listening on {addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;

    info!("server on {addr} shut down");
    Ok(())
}
