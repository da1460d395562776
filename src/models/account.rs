// src/models/account.rs

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

static USERNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_]+$").expect("username pattern is a valid regex")
});

/// Represents the 'accounts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: i64,

    /// Exclusive only once the account is verified.
    pub username: String,

    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password_hash: String,

    #[serde(skip)]
    pub verify_code: String,

    #[serde(skip)]
    pub verify_code_expire: DateTime<Utc>,

    pub is_verified: bool,

    pub is_accepting_messages: bool,

    pub created_at: DateTime<Utc>,
}

/// Session context derived at sign-in and carried in the bearer token.
/// Not refreshed when the account changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    #[serde(rename = "_id")]
    pub id: i64,
    pub username: String,
    pub is_verified: bool,
    pub is_accepting_messages: bool,
}

impl From<&Account> for SessionUser {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            is_verified: account.is_verified,
            is_accepting_messages: account.is_accepting_messages,
        }
    }
}

/// DTO for registration.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        length(min = 3, max = 20, message = "Username must be between 3 and 20 characters"),
        regex(
            path = *USERNAME_RE,
            message = "Username must contain only letters, numbers and underscores"
        )
    )]
    pub username: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
}

/// DTO for submitting a verification code.
#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    pub username: String,
    pub code: String,
}

/// Query for the username checks (`?username=`).
#[derive(Debug, Deserialize, Validate)]
pub struct UsernameQuery {
    #[validate(
        length(min = 3, max = 20, message = "Username must be between 3 and 20 characters"),
        regex(
            path = *USERNAME_RE,
            message = "Username must contain only letters, numbers and underscores"
        )
    )]
    #[serde(default)]
    pub username: String,
}

/// DTO for sign-in. `identifier` is a username or an email.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub identifier: String,
    pub password: String,
}

/// DTO for toggling the acceptance flag.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptMessagesRequest {
    pub accept_messages: bool,
}
