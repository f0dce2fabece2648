use crate::{
    error::AppError,
    exposition,
};
use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use sbercdn_exporter_collector::Registry;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
    pub shutdown: CancellationToken,
}

pub fn create_router(registry: Registry, shutdown: CancellationToken) -> Router {
    let state = AppState { registry, shutdown };

    Router::new()
        .route("/metrics", get(metrics))
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    if state.shutdown.is_cancelled() {
        return Err(AppError::ShuttingDown);
    }
    let families = state.registry.gather().await;
    Ok(([(header::CONTENT_TYPE, exposition::CONTENT_TYPE)], exposition::render(&families)))
}

async fn healthz() -> &'static str {
    "OK"
}
