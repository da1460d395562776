// src/handlers/auth.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    config::Config,
    error::AppError,
    extract::{JsonBody, QueryParams},
    models::account::{RegisterRequest, SignInRequest, UsernameQuery, VerifyCodeRequest},
    services::accounts,
    utils::{
        jwt::{Claims, sign_jwt},
        mailer::Mailer,
    },
};

/// Registers (or re-registers) an unverified account and mails its code.
///
/// Returns 201 Created. The account is not usable until verified.
pub async fn register(
    State(pool): State<SqlitePool>,
    State(mailer): State<Arc<dyn Mailer>>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let account = accounts::register(&pool, mailer.as_ref(), &payload, Utc::now()).await?;
    tracing::info!("Registered account {} ({})", account.id, account.username);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User registered successfully. Please verify your account.",
        })),
    ))
}

/// Confirms the emailed code.
///
/// An unknown username is a 400 here like every other verification failure.
pub async fn verify(
    State(pool): State<SqlitePool>,
    JsonBody(payload): JsonBody<VerifyCodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    accounts::verify_code(&pool, &payload.username, &payload.code, Utc::now())
        .await
        .map_err(|e| match e {
            AppError::NotFound(msg) => AppError::ValidationError(msg),
            other => other,
        })?;

    Ok(Json(json!({
        "success": true,
        "message": "Account verified successfully",
    })))
}

/// Live username availability check for the sign-up form.
pub async fn check_username(
    State(pool): State<SqlitePool>,
    QueryParams(query): QueryParams<UsernameQuery>,
) -> Result<impl IntoResponse, AppError> {
    accounts::check_username_available(&pool, &query).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Username is unique",
    })))
}

/// Authenticates by username or email and returns a bearer token.
///
/// The token carries the session context as of now; later changes to the
/// account are not reflected until a new token is issued.
pub async fn sign_in(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    JsonBody(payload): JsonBody<SignInRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = accounts::authenticate(&pool, &payload.identifier, &payload.password).await?;
    let token = sign_jwt(&user, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "success": true,
        "message": "Signed in",
        "token": token,
        "tokenType": "Bearer",
        "user": user,
    })))
}

/// Re-derives the session from the store and issues a fresh token.
pub async fn refresh_session(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = accounts::refresh_session(&pool, &claims).await?;
    let token = sign_jwt(&user, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "success": true,
        "token": token,
        "tokenType": "Bearer",
        "user": user,
    })))
}
