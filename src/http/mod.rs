//! HTTP surface of the inference service.
//!
//! An Axum router exposing the banner, health and prediction endpoints over
//! a shared [`InferenceContext`](crate::context::InferenceContext).

mod routes;

pub use routes::{
    build_router, health, home, predict, run_http_server, status_for, BannerResponse,
    HealthResponse, HttpServerError, HttpState, UPLOAD_FIELD,
};

use crate::config::AppConfig;
use crate::context::InferenceContext;

/// Load the predictor and serve until Ctrl-C
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let context = InferenceContext::from_config(&config);
    if !context.predictor().is_ready() {
        log::warn!(
            "Serving without a model: {}",
            context.predictor().status_label()
        );
    }

    run_http_server(
        HttpState::new(context),
        config.server.addr,
        config.server.max_upload_bytes,
    )
    .await
}
