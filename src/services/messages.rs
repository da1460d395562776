// src/services/messages.rs

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::message::{Message, SendMessageRequest},
    utils::jwt::Claims,
};

use super::{accounts::find_by_username, ensure_account_exists, ensure_owner};

/// Appends an anonymous message to the account owning `username`.
pub async fn send_message(
    pool: &SqlitePool,
    req: &SendMessageRequest,
    now: DateTime<Utc>,
) -> Result<Message, AppError> {
    req.validate()?;

    let account = find_by_username(pool, &req.username)
        .await?
        .ok_or_else(AppError::user_not_found)?;

    if !account.is_accepting_messages {
        return Err(AppError::NotAccepting);
    }

    // The flag is re-checked in the same statement as the insert.
    let message = sqlx::query_as::<_, Message>(
        r#"
        INSERT INTO messages (account_id, content, created_at)
        SELECT id, ?, ? FROM accounts
        WHERE id = ? AND is_accepting_messages = TRUE
        RETURNING *
        "#,
    )
    .bind(&req.content)
    .bind(now)
    .bind(account.id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotAccepting)?;

    tracing::debug!("Message {} delivered to account {}", message.id, account.id);
    Ok(message)
}

/// All messages of the account, newest first. Ties keep insertion order reversed.
pub async fn list_messages(
    pool: &SqlitePool,
    caller: &Claims,
    account_id: i64,
) -> Result<Vec<Message>, AppError> {
    ensure_owner(caller, account_id)?;
    ensure_account_exists(pool, account_id).await?;

    let messages = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, account_id, content, created_at
        FROM messages
        WHERE account_id = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(account_id)
    .fetch_all(pool)
    .await?;

    Ok(messages)
}

/// Removes one message of the account. Returns whether a row was removed;
/// an unknown id is not an error.
pub async fn delete_message(
    pool: &SqlitePool,
    caller: &Claims,
    account_id: i64,
    message_id: i64,
) -> Result<bool, AppError> {
    ensure_owner(caller, account_id)?;
    ensure_account_exists(pool, account_id).await?;

    let result = sqlx::query("DELETE FROM messages WHERE id = ? AND account_id = ?")
        .bind(message_id)
        .bind(account_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
