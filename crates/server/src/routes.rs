use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tailortalk_agent::AgentRuntime;
use tailortalk_core::domain::request::ExtractedFields;
use tailortalk_core::errors::InterfaceError;
use tower_http::cors::CorsLayer;
use tracing::warn;
use uuid::Uuid;

use crate::health;

pub const SERVICE_BANNER: &str = "TailorTalk Calendar Agent Backend";

#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<AgentRuntime>,
    pub calendar_provider: &'static str,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentReply {
    pub response: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct Banner {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    correlation_id: &'a str,
}

/// HTTP face of [`InterfaceError`]: the status follows the variant, the body
/// carries only the stable user message.
#[derive(Debug)]
pub struct ApiError(InterfaceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        };
        let body =
            ErrorBody { error: self.0.user_message(), correlation_id: self.0.correlation_id() };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: AppState, cors_permissive: bool) -> Router {
    let router = Router::new()
        .route("/", get(root))
        .route("/agent", post(agent))
        .route("/extract", post(extract))
        .route("/health", get(health::health))
        .with_state(state);

    if cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

async fn root() -> Json<Banner> {
    Json(Banner { message: SERVICE_BANNER })
}

async fn agent(
    State(state): State<AppState>,
    payload: Result<Json<MessageRequest>, JsonRejection>,
) -> Result<Json<AgentReply>, ApiError> {
    let Json(request) = payload.map_err(reject)?;
    let response = state.runtime.handle_message(&request.message).await;
    Ok(Json(AgentReply { response }))
}

async fn extract(
    State(state): State<AppState>,
    payload: Result<Json<MessageRequest>, JsonRejection>,
) -> Result<Json<ExtractedFields>, ApiError> {
    let Json(request) = payload.map_err(reject)?;
    let fields = ExtractedFields::from(&state.runtime.extract(&request.message));
    Ok(Json(fields))
}

fn reject(rejection: JsonRejection) -> ApiError {
    let correlation_id = Uuid::new_v4().to_string();
    warn!(
        event_name = "http.request_rejected",
        correlation_id = %correlation_id,
        status = rejection.status().as_u16(),
        reason = %rejection.body_text(),
        "request body could not be decoded"
    );
    ApiError(InterfaceError::BadRequest { message: rejection.body_text(), correlation_id })
}
