use axum::{extract::State, Json};
use serde::Deserialize;

use crate::api::middleware::AppError;
use crate::api::routes::AppState;
use crate::models::{AnalysisResponse, ChatTurn};

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

/// Answer a natural-language analytics question.
///
/// Pipeline failures (generation, validation, execution) are reported inside
/// the response body so the operator still sees elapsed time and the SQL
/// involved; HTTP errors are reserved for malformed requests.
pub async fn ask_question(
    State(state): State<AppState>,
    Json(payload): Json<AskRequest>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let question = payload.question.trim();
    if question.is_empty() {
        return Err(AppError::Validation("Question cannot be empty".to_string()));
    }

    tracing::info!("Received analytics question: {}", question);

    let response = state.analytics.ask(question, &payload.history).await;

    Ok(Json(response))
}
