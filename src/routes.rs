// src/routes.rs

use axum::{
    Json, Router, http::Method, middleware,
    routing::{get, patch, post},
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{analytics, attempt, auth, quiz},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, quizzes, me).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool + Config).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    // Quiz authoring is admin-only; everything else under /quizzes is
    // ownership-checked in the handlers.
    let quiz_admin_routes = Router::new()
        .route("/", post(quiz::create_quiz))
        .route("/mine", get(quiz::list_my_quizzes))
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let quiz_protected_routes = Router::new()
        .route(
            "/{id}",
            get(quiz::get_quiz)
                .patch(quiz::update_quiz)
                .delete(quiz::delete_quiz),
        )
        .route("/{id}/publish", patch(quiz::publish_quiz))
        .route("/{id}/questions", post(quiz::add_question))
        .route(
            "/{id}/questions/{qid}",
            patch(quiz::update_question).delete(quiz::delete_question),
        )
        .route("/{id}/attempts", post(attempt::submit_attempt))
        .route("/{id}/analytics", get(analytics::quiz_analytics))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let quiz_routes = Router::new()
        .route("/", get(quiz::list_quizzes))
        .merge(quiz_admin_routes)
        .merge(quiz_protected_routes);

    let me_routes = Router::new()
        .route("/attempts", get(attempt::my_attempts))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/api/v1/health", get(|| async { Json(json!({ "ok": true })) }))
        .nest("/api/v1/auth", auth_routes)
        .nest("/api/v1/quizzes", quiz_routes)
        .nest("/api/v1/me", me_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
