use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::core::errors::ApiError;
use crate::documents::DocumentRecord;
use crate::server::handlers::utils::require_user;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub name: Option<String>,
}

/// Accepts raw document bytes, stores them, and builds the vector index
/// up front so the first question does not pay the build cost.
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = require_user(&headers)?;

    if body.is_empty() {
        return Err(ApiError::BadRequest("Request body is empty".to_string()));
    }
    let name = params.name.as_deref().map(str::trim).unwrap_or("");
    if name.is_empty() {
        return Err(ApiError::BadRequest("Missing document name".to_string()));
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let document_id = Uuid::new_v4().to_string();
    state
        .blobs
        .put(&user_id, &document_id, &body)
        .await
        .map_err(ApiError::internal)?;

    let record = DocumentRecord {
        id: document_id.clone(),
        owner_id: user_id.clone(),
        name: name.to_string(),
        size: body.len() as i64,
        content_type,
        created_at: chrono::Utc::now().to_rfc3339(),
    };
    state.documents.insert(&record).await?;

    let index = state.index.resolve(&user_id, &document_id).await?;

    tracing::info!(
        "Uploaded document {} ({} bytes) for user {}",
        document_id,
        body.len(),
        user_id
    );
    Ok(Json(json!({
        "document": document_payload(&record),
        "namespace": index.namespace()
    })))
}

pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = require_user(&headers)?;

    let documents = state.documents.list(&user_id).await?;
    let result: Vec<Value> = documents.iter().map(document_payload).collect();

    Ok(Json(json!({"documents": result})))
}

pub async fn get_document(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(document_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = require_user(&headers)?;

    let record = state
        .documents
        .get(&user_id, &document_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;

    let indexed = state
        .vector
        .namespace_exists(&document_id)
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(json!({
        "document": document_payload(&record),
        "indexed": indexed
    })))
}

/// Removes the metadata row, the stored bytes, the vector namespace, and
/// the conversation transcript for a document.
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(document_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = require_user(&headers)?;

    let deleted = state.documents.delete(&user_id, &document_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Document not found".to_string()));
    }

    if let Err(err) = state.blobs.remove(&user_id, &document_id).await {
        tracing::warn!(
            "Failed to remove stored bytes for document {}: {}",
            document_id,
            err
        );
    }
    state
        .vector
        .delete_namespace(&document_id)
        .await
        .map_err(ApiError::internal)?;
    state
        .history
        .delete_conversation(&user_id, &document_id)
        .await?;

    tracing::info!("Deleted document {} for user {}", document_id, user_id);
    Ok(Json(json!({"success": true})))
}

fn document_payload(record: &DocumentRecord) -> Value {
    json!({
        "id": record.id,
        "name": record.name,
        "size": record.size,
        "content_type": record.content_type,
        "created_at": record.created_at
    })
}
