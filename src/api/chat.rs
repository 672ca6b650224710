use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{api::error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct ChatQuery {
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
}

/// POST /ask-chatbot
///
/// Always answers 200 once the body parses; upstream failures are reported
/// inside the answer text.
pub async fn ask_chatbot(
    State(state): State<AppState>,
    body: Result<Json<ChatQuery>, JsonRejection>,
) -> Result<Json<ChatAnswer>, ApiError> {
    let Json(query) = body?;
    let answer = state.chat.answer(&query.question).await;
    Ok(Json(ChatAnswer { answer }))
}
