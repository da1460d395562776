// src/services/mod.rs
//
// Account and message rules, independent of HTTP. Handlers stay thin.

pub mod accounts;
pub mod messages;

use sqlx::SqlitePool;

use crate::{error::AppError, utils::jwt::Claims};

/// Owner-only operations require the session to belong to `account_id`.
pub fn ensure_owner(caller: &Claims, account_id: i64) -> Result<(), AppError> {
    if caller.account_id()? != account_id {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

async fn ensure_account_exists(pool: &SqlitePool, account_id: i64) -> Result<(), AppError> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM accounts WHERE id = ?")
        .bind(account_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(AppError::user_not_found)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims_for(sub: &str) -> Claims {
        Claims {
            sub: sub.to_string(),
            username: "alice".into(),
            is_verified: true,
            is_accepting_messages: true,
            exp: 0,
        }
    }

    #[test]
    fn owner_check() {
        assert!(ensure_owner(&claims_for("3"), 3).is_ok());
        assert!(matches!(
            ensure_owner(&claims_for("3"), 4),
            Err(AppError::Unauthorized)
        ));
    }
}
