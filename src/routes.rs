// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{delete, get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{acceptance, auth, messages},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Public routes: registration, verification, sign-in, message intake.
/// * Owner routes: inbox and acceptance flag, behind the bearer-token check.
/// * Global middleware: Trace, CORS.
pub fn create_router(state: AppState) -> Router {
    let allow_origin = if state.config.cors_origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let public_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/verify", post(auth::verify))
        .route("/check-username", get(auth::check_username))
        .route("/sign-in", post(auth::sign_in))
        .route("/send-message", post(messages::send_message))
        .route("/check-accepting", get(acceptance::check_accepting));

    let owner_routes = Router::new()
        .route("/session", get(auth::refresh_session))
        .route("/messages", get(messages::list_messages))
        .route("/messages/{id}", delete(messages::delete_message))
        .route(
            "/acceptance",
            get(acceptance::get_acceptance).post(acceptance::set_acceptance),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api", public_routes.merge(owner_routes))
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
