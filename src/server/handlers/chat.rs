use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::errors::ApiError;
use crate::history::ChatRole;
use crate::server::handlers::utils::require_user;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// Answers a question about one document. The question is persisted
/// before generation, so a failed answer still shows up in the
/// transcript; the answer is persisted only on success.
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<AskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = require_user(&headers)?;

    let question = payload.question.trim().to_string();
    if question.is_empty() {
        return Err(ApiError::BadRequest("Question is empty".to_string()));
    }

    state
        .documents
        .get(&user_id, &document_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;

    if let Some(limit) = state.settings.chat.question_limit {
        let asked = state.history.count_questions(&user_id, &document_id).await?;
        if asked >= limit {
            return Err(ApiError::LimitExceeded(format!(
                "Question limit of {} reached for this document",
                limit
            )));
        }
    }

    state
        .history
        .append(&user_id, &document_id, ChatRole::Human, &question)
        .await?;

    let answer = state
        .pipeline
        .answer_question(&user_id, &document_id, &question)
        .await?;

    state
        .history
        .append(&user_id, &document_id, ChatRole::Ai, &answer)
        .await?;

    Ok(Json(json!({"answer": answer})))
}

pub async fn get_messages(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<String>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = require_user(&headers)?;

    state
        .documents
        .get(&user_id, &document_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;

    // limit 0 returns the full transcript
    let limit = params
        .get("limit")
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(0);

    let messages = state.history.load(&user_id, &document_id, limit).await?;
    let formatted: Vec<Value> = messages
        .into_iter()
        .map(|msg| {
            json!({
                "id": msg.id,
                "role": msg.role.as_str(),
                "content": msg.content,
                "created_at": msg.created_at
            })
        })
        .collect();

    Ok(Json(json!({"messages": formatted})))
}
