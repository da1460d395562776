// src/handlers/messages.rs

use axum::{
    Extension, Json,
    extract::State,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    extract::{JsonBody, PathParam},
    models::message::SendMessageRequest,
    services::messages,
    utils::jwt::Claims,
};

/// Public: drop an anonymous message for `username`.
pub async fn send_message(
    State(pool): State<SqlitePool>,
    JsonBody(payload): JsonBody<SendMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    messages::send_message(&pool, &payload, Utc::now()).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Message sent successfully",
    })))
}

/// The caller's inbox, newest first.
pub async fn list_messages(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let account_id = claims.account_id()?;
    let messages = messages::list_messages(&pool, &claims, account_id).await?;

    Ok(Json(json!({
        "success": true,
        "messages": messages,
    })))
}

pub async fn delete_message(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    PathParam(message_id): PathParam<i64>,
) -> Result<impl IntoResponse, AppError> {
    let account_id = claims.account_id()?;
    let removed = messages::delete_message(&pool, &claims, account_id, message_id).await?;
    if !removed {
        tracing::debug!(
            "Delete of unknown message {} for account {}",
            message_id,
            account_id
        );
    }

    Ok(Json(json!({
        "success": true,
        "message": "Message deleted",
    })))
}
