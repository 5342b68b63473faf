use std::net::SocketAddr;

use axum::{extract::Request, routing::get, Router, ServiceExt};
use tower_http::{cors::CorsLayer, normalize_path::NormalizePath, trace::TraceLayer};

use crate::config::AppConfig;
use crate::state::AppState;
use crate::{auth, dashboard, goals, nutrition, progress, users, workouts};

pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(users::router())
        .merge(goals::router())
        .merge(nutrition::router())
        .merge(workouts::router())
        .merge(progress::router())
        .merge(dashboard::router())
}

/// Routes are registered without a trailing slash; `/api/goals/` and
/// `/api/goals` reach the same handler.
pub fn build_app(state: AppState) -> NormalizePath<Router> {
    NormalizePath::trim_trailing_slash(router(state))
}

fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_router())
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: NormalizePath<Router>, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await?;
    Ok(())
}
