use std::sync::Arc;

use crate::{config::Config, utils::mailer::Mailer};
use axum::extract::FromRef;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub mailer: Arc<dyn Mailer>,
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<dyn Mailer> {
    fn from_ref(state: &AppState) -> Self {
        state.mailer.clone()
    }
}
