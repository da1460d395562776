// src/services/accounts.rs

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::{AppError, is_unique_violation},
    models::account::{Account, RegisterRequest, SessionUser, UsernameQuery},
    utils::{
        hash::{generate_verify_code, hash_password, verify_password},
        jwt::Claims,
        mailer::Mailer,
    },
};

use super::ensure_owner;

/// How long an issued verification code stays valid.
pub const VERIFY_CODE_TTL_HOURS: i64 = 1;

/// The verified holder of `username`, if any.
pub async fn find_verified_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<Account>, AppError> {
    let account = sqlx::query_as::<_, Account>(
        "SELECT * FROM accounts WHERE username = ? AND is_verified = TRUE",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(account)
}

/// Resolves a username to one account. Unverified records may share a
/// username, so the verified holder wins, then the newest record.
pub async fn find_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<Account>, AppError> {
    let account = sqlx::query_as::<_, Account>(
        r#"
        SELECT * FROM accounts
        WHERE username = ?
        ORDER BY is_verified DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(account)
}

pub async fn find_by_id(pool: &SqlitePool, account_id: i64) -> Result<Option<Account>, AppError> {
    let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
        .bind(account_id)
        .fetch_optional(pool)
        .await?;

    Ok(account)
}

/// Creates an unverified account, or re-issues credentials and code for an
/// unverified account registered with the same email, then mails the code.
/// A re-registration keeps the username the record was created with.
///
/// A dispatch failure is reported as `MailDispatch`; the account row is kept
/// so that registering again acts as a resend.
pub async fn register(
    pool: &SqlitePool,
    mailer: &dyn Mailer,
    req: &RegisterRequest,
    now: DateTime<Utc>,
) -> Result<Account, AppError> {
    req.validate()?;

    if find_verified_by_username(pool, &req.username).await?.is_some() {
        return Err(AppError::UsernameTaken);
    }

    let existing = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE email = ?")
        .bind(&req.email)
        .fetch_optional(pool)
        .await?;

    if existing.as_ref().is_some_and(|account| account.is_verified) {
        return Err(AppError::EmailTaken);
    }

    let password_hash = hash_password(&req.password)?;
    let verify_code = generate_verify_code();
    let verify_code_expire = now + Duration::hours(VERIFY_CODE_TTL_HOURS);

    let account = match existing {
        Some(unverified) => {
            tracing::info!(
                "Re-registration for unverified account {}, reissuing code",
                unverified.id
            );
            sqlx::query_as::<_, Account>(
                r#"
                UPDATE accounts
                SET password_hash = ?, verify_code = ?, verify_code_expire = ?
                WHERE id = ? AND is_verified = FALSE
                RETURNING *
                "#,
            )
            .bind(&password_hash)
            .bind(&verify_code)
            .bind(verify_code_expire)
            .bind(unverified.id)
            .fetch_optional(pool)
            .await?
            // Verified between the lookup and the update.
            .ok_or(AppError::EmailTaken)?
        }
        None => sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (
                username, email, password_hash, verify_code, verify_code_expire,
                is_verified, is_accepting_messages, created_at
            )
            VALUES (?, ?, ?, ?, ?, FALSE, TRUE, ?)
            RETURNING *
            "#,
        )
        .bind(&req.username)
        .bind(&req.email)
        .bind(&password_hash)
        .bind(&verify_code)
        .bind(verify_code_expire)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::EmailTaken
            } else {
                tracing::error!("Failed to register account: {:?}", e);
                AppError::from(e)
            }
        })?,
    };

    mailer
        .send_verification_code(&account.email, &account.username, &verify_code)
        .await
        .map_err(|e| AppError::MailDispatch(e.to_string()))?;

    Ok(account)
}

/// Marks the account verified when `code` matches and has not expired.
/// A wrong code is reported before an expired one.
///
/// Several unverified records may share `username`; the code picks which
/// one is being verified.
pub async fn verify_code(
    pool: &SqlitePool,
    username: &str,
    code: &str,
    now: DateTime<Utc>,
) -> Result<Account, AppError> {
    let newest = find_by_username(pool, username)
        .await?
        .ok_or_else(AppError::user_not_found)?;

    if newest.is_verified {
        return Err(AppError::AlreadyVerified);
    }

    let account = sqlx::query_as::<_, Account>(
        r#"
        SELECT * FROM accounts
        WHERE username = ? AND is_verified = FALSE AND verify_code = ?
        ORDER BY verify_code_expire DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(username)
    .bind(code)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::InvalidCode)?;

    if now >= account.verify_code_expire {
        return Err(AppError::CodeExpired);
    }

    let verified = sqlx::query_as::<_, Account>(
        "UPDATE accounts SET is_verified = TRUE WHERE id = ? AND is_verified = FALSE RETURNING *",
    )
    .bind(account.id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        // Another account verified this username first.
        if is_unique_violation(&e) {
            AppError::UsernameTaken
        } else {
            AppError::from(e)
        }
    })?
    .ok_or(AppError::AlreadyVerified)?;

    tracing::info!("Account {} verified", verified.id);
    Ok(verified)
}

/// Ok when the username is well-formed and no verified account holds it.
pub async fn check_username_available(
    pool: &SqlitePool,
    query: &UsernameQuery,
) -> Result<(), AppError> {
    query.validate()?;

    if find_verified_by_username(pool, &query.username).await?.is_some() {
        return Err(AppError::UsernameTaken);
    }

    Ok(())
}

/// Credential check for sign-in. `identifier` matches a username or an email.
pub async fn authenticate(
    pool: &SqlitePool,
    identifier: &str,
    password: &str,
) -> Result<SessionUser, AppError> {
    let account = sqlx::query_as::<_, Account>(
        r#"
        SELECT * FROM accounts
        WHERE username = ? OR email = ?
        ORDER BY is_verified DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(identifier)
    .bind(identifier)
    .fetch_optional(pool)
    .await?
    .ok_or_else(AppError::user_not_found)?;

    if !account.is_verified {
        return Err(AppError::NotVerified);
    }

    if !verify_password(password, &account.password_hash)? {
        return Err(AppError::BadCredentials);
    }

    Ok(SessionUser::from(&account))
}

pub async fn get_acceptance_status(
    pool: &SqlitePool,
    caller: &Claims,
    account_id: i64,
) -> Result<bool, AppError> {
    ensure_owner(caller, account_id)?;

    let account = find_by_id(pool, account_id)
        .await?
        .ok_or_else(AppError::user_not_found)?;

    Ok(account.is_accepting_messages)
}

/// Persists the flag. Existing messages are untouched.
pub async fn set_acceptance_status(
    pool: &SqlitePool,
    caller: &Claims,
    account_id: i64,
    accepting: bool,
) -> Result<Account, AppError> {
    ensure_owner(caller, account_id)?;

    let account = sqlx::query_as::<_, Account>(
        "UPDATE accounts SET is_accepting_messages = ? WHERE id = ? RETURNING *",
    )
    .bind(accepting)
    .bind(account_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(AppError::user_not_found)?;

    Ok(account)
}

/// Public probe used by the share page: does this verified user accept messages?
pub async fn check_accepting(pool: &SqlitePool, query: &UsernameQuery) -> Result<bool, AppError> {
    query.validate()?;

    let account = find_verified_by_username(pool, &query.username)
        .await?
        .ok_or_else(AppError::user_not_found)?;

    Ok(account.is_accepting_messages)
}

/// Re-reads the account behind a session, for callers that need fresh state.
pub async fn refresh_session(pool: &SqlitePool, caller: &Claims) -> Result<SessionUser, AppError> {
    let account = find_by_id(pool, caller.account_id()?)
        .await?
        .ok_or_else(AppError::user_not_found)?;

    Ok(SessionUser::from(&account))
}
