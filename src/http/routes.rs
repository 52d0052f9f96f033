use std::net::SocketAddr;

use anyhow::Context;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::context::InferenceContext;
use crate::error::{
    log_input_error, log_model_error, ErrorCode, InputError, InputErrorCodes, ModelError,
    ServiceError,
};
use crate::response::PredictionResult;

/// Multipart field carrying the recording
pub const UPLOAD_FIELD: &str = "file";

/// Shared application state for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub context: InferenceContext,
}

impl HttpState {
    pub fn new(context: InferenceContext) -> Self {
        Self { context }
    }
}

/// HTTP error variants mapped to JSON responses.
#[derive(Debug)]
pub enum HttpServerError {
    Service(ServiceError),
    Multipart(MultipartError),
    MultipartRejected(MultipartRejection),
}

impl From<ServiceError> for HttpServerError {
    fn from(err: ServiceError) -> Self {
        Self::Service(err)
    }
}

impl From<InputError> for HttpServerError {
    fn from(err: InputError) -> Self {
        Self::Service(ServiceError::Input(err))
    }
}

impl From<ModelError> for HttpServerError {
    fn from(err: ModelError) -> Self {
        Self::Service(ServiceError::Model(err))
    }
}

/// Status code for a pipeline failure
pub fn status_for(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::Input(_) => StatusCode::BAD_REQUEST,
        ServiceError::Model(ModelError::Unavailable { .. }) => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::Model(_) | ServiceError::TaskFailed { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Service(err) => {
                match &err {
                    ServiceError::Input(input) => log_input_error(input, "POST /predict"),
                    ServiceError::Model(model) => log_model_error(model, "POST /predict"),
                    ServiceError::TaskFailed { .. } => {
                        log::error!("Inference task failed in POST /predict: {}", err)
                    }
                }
                (status_for(&err), err.code(), err.message())
            }
            Self::Multipart(err) => (
                err.status(),
                InputErrorCodes::DECODE,
                err.body_text(),
            ),
            Self::MultipartRejected(err) => (
                err.status(),
                InputErrorCodes::DECODE,
                err.body_text(),
            ),
        };

        (
            status,
            Json(serde_json::json!({ "error": message, "code": code })),
        )
            .into_response()
    }
}

/// Root endpoint response payload.
#[derive(Debug, Serialize)]
pub struct BannerResponse {
    pub message: &'static str,
}

/// Health endpoint response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_ready: bool,
    pub model_status: String,
}

/// Build the Axum router with all handlers.
pub fn build_router(state: HttpState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/predict", post(predict))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server loop until Ctrl-C.
pub async fn run_http_server(
    state: HttpState,
    addr: SocketAddr,
    max_upload_bytes: usize,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding HTTP listener on {}", addr))?;
    log::info!("HTTP server listening on {}", addr);

    let router = build_router(state, max_upload_bytes);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP router")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}

pub async fn home() -> Json<BannerResponse> {
    Json(BannerResponse {
        message: "Earthquake Prediction API is running",
    })
}

pub async fn health(State(state): State<HttpState>) -> Json<HealthResponse> {
    let predictor = state.context.predictor();
    Json(HealthResponse {
        status: "ok",
        model_ready: predictor.is_ready(),
        model_status: predictor.status_label(),
    })
}

pub async fn predict(
    State(state): State<HttpState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictionResult>, HttpServerError> {
    state.context.predictor().ensure_ready()?;

    let mut multipart = multipart.map_err(HttpServerError::MultipartRejected)?;
    let bytes = read_upload(&mut multipart).await?;

    let result = state.context.predict_upload(bytes).await?;
    log::info!(
        "POST /predict -> event_probability={} event_detected={}",
        result.event_probability,
        result.event_detected
    );
    Ok(Json(result))
}

/// Pull the bytes of the upload field, skipping any other parts
async fn read_upload(multipart: &mut Multipart) -> Result<Vec<u8>, HttpServerError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(HttpServerError::Multipart)?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let bytes = field.bytes().await.map_err(HttpServerError::Multipart)?;
            return Ok(bytes.to_vec());
        }
    }

    Err(InputError::MissingUpload {
        field: UPLOAD_FIELD.to_string(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, ScriptedPredictor};
    use crate::model::{PredictorHandle, RawPrediction};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    const BOUNDARY: &str = "quake-test-boundary";

    fn make_router(handle: PredictorHandle) -> Router {
        let state = HttpState::new(InferenceContext::new(handle));
        build_router(state, 1024 * 1024)
    }

    fn scripted_router(output: RawPrediction) -> Router {
        make_router(PredictorHandle::ready(Box::new(ScriptedPredictor::new(output))))
    }

    fn multipart_body(field: &str, payload: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"trace.wav\"\r\nContent-Type: audio/wav\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(payload);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn predict_request(field: &str, payload: &[u8]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(field, payload)))
            .expect("predict request")
    }

    async fn response_json(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body bytes");
        let json = serde_json::from_slice::<Value>(&bytes).expect("JSON body");
        (status, json)
    }

    #[tokio::test]
    async fn home_returns_banner() {
        let router = scripted_router(RawPrediction::new(0.1, 0.0, 0.0));
        let response = router
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let (status, json) = response_json(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Earthquake Prediction API is running");
    }

    #[tokio::test]
    async fn health_reports_unavailable_model() {
        let router = make_router(PredictorHandle::unavailable("Model not found at /x"));
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let (status, json) = response_json(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["model_ready"], false);
        assert_eq!(json["model_status"], "Model not found at /x");
    }

    #[tokio::test]
    async fn predict_detected_event() {
        let router = scripted_router(RawPrediction::new(0.875, 0.25, 0.5));
        let wav = fixtures::encode_wav(&fixtures::synthetic_recording(6000, 3, 3, None)).unwrap();
        let response = router.oneshot(predict_request("file", &wav)).await.unwrap();
        let (status, json) = response_json(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["event_detected"], true);
        assert_eq!(json["event_probability"], 0.875);
        assert_eq!(json["p_prediction"], 15.0);
        assert_eq!(json["s_prediction"], 30.0);
    }

    #[tokio::test]
    async fn predict_wrong_field_is_bad_request() {
        let router = scripted_router(RawPrediction::new(0.875, 0.25, 0.5));
        let wav = fixtures::encode_wav(&fixtures::silence(100, 1)).unwrap();
        let response = router.oneshot(predict_request("upload", &wav)).await.unwrap();
        let (status, json) = response_json(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], 1005);
    }

    #[tokio::test]
    async fn predict_without_multipart_is_bad_request() {
        let router = scripted_router(RawPrediction::new(0.875, 0.25, 0.5));
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/predict")
                    .body(Body::from("raw"))
                    .unwrap(),
            )
            .await
            .unwrap();
        let (status, json) = response_json(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            status_for(&ServiceError::Input(InputError::ShapeMismatch { channels: 2 })),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&ServiceError::Model(ModelError::Unavailable {
                reason: String::new()
            })),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&ServiceError::Model(ModelError::Inference {
                reason: String::new()
            })),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
