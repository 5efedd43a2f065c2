use crate::error::Error;
use crate::intent::{self, Intent};
use crate::llm::LlmClient;
use crate::pipeline::{GenerationRequest, PipelineRunner};
use crate::template::TemplateStore;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<dyn LlmClient>,
    pub templates: Arc<TemplateStore>,
    pub system_prompt: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/writer", post(writer))
        .route("/chat", post(chat))
        .with_state(state)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WriterResponse {
    pub results: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
}

async fn writer(
    State(state): State<AppState>,
    Json(req): Json<GenerationRequest>,
) -> Result<Json<WriterResponse>, Error> {
    let runner = PipelineRunner::new(state.templates.clone(), state.llm.clone());
    let results = runner.run(&req).await?;
    Ok(Json(WriterResponse { results }))
}

async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, Error> {
    if req.message.trim().is_empty() {
        return Err(Error::Validation("message must not be empty".to_string()));
    }

    let intent = intent::classify(state.llm.as_ref(), &req.message).await?;
    let message = match intent {
        // Unknown falls back to the general assistant reply.
        Intent::TravelPlan | Intent::Unknown => {
            state.llm.chat(&state.system_prompt, &req.message).await?
        }
        Intent::CustomerSupport => "Here is customer support number: 1234567890".to_string(),
        Intent::Reservation => "Here is reservation number: 0987654321".to_string(),
    };

    Ok(Json(ChatResponse { message }))
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Template { .. } | Error::Render { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Upstream(_) => StatusCode::BAD_GATEWAY,
        };
        log::error!("request failed: {}", self);
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
