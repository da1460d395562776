// src/handlers/acceptance.rs

use axum::{
    Extension, Json,
    extract::State,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    config::Config,
    error::AppError,
    extract::{JsonBody, QueryParams},
    models::account::{AcceptMessagesRequest, SessionUser, UsernameQuery},
    services::accounts,
    utils::jwt::{Claims, sign_jwt},
};

/// Current acceptance flag, read from the store rather than the token.
pub async fn get_acceptance(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let account_id = claims.account_id()?;
    let accepting = accounts::get_acceptance_status(&pool, &claims, account_id).await?;

    Ok(Json(json!({
        "success": true,
        "isAcceptingMessages": accepting,
    })))
}

/// Flips the acceptance flag and hands back a token reflecting it.
pub async fn set_acceptance(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    JsonBody(payload): JsonBody<AcceptMessagesRequest>,
) -> Result<impl IntoResponse, AppError> {
    let account_id = claims.account_id()?;
    let account =
        accounts::set_acceptance_status(&pool, &claims, account_id, payload.accept_messages)
            .await?;

    let token = sign_jwt(
        &SessionUser::from(&account),
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "success": true,
        "message": "Message acceptance status updated successfully",
        "isAcceptingMessages": account.is_accepting_messages,
        "token": token,
    })))
}

/// Public: whether a verified user currently accepts messages.
pub async fn check_accepting(
    State(pool): State<SqlitePool>,
    QueryParams(query): QueryParams<UsernameQuery>,
) -> Result<impl IntoResponse, AppError> {
    let accepting = accounts::check_accepting(&pool, &query).await?;

    Ok(Json(json!({
        "success": true,
        "isAcceptingMessages": accepting,
    })))
}
