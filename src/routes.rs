// src/routes.rs

use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{quiz, timetable},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware, student_middleware},
};

/// Assembles the main application router.
///
/// * Student quiz routes and admin timetable routes, each behind auth + role.
/// * Global middleware (Trace, CORS).
/// * Injects global state.
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let quiz_routes = Router::new()
        .route("/", get(quiz::list_quizzes))
        .route(
            "/attempt",
            get(quiz::get_attempt).delete(quiz::cancel_attempt),
        )
        .route("/attempt/answers", put(quiz::select_answer))
        .route("/attempt/submit", post(quiz::submit_attempt))
        .route("/{quiz_id}/start", post(quiz::start_quiz))
        .route("/{quiz_id}/results", get(quiz::get_results))
        // Auth first, then the student check
        .layer(middleware::from_fn(student_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let timetable_routes = Router::new()
        .route("/", get(timetable::list_timetables))
        .route("/drafts", post(timetable::open_draft))
        .route(
            "/drafts/{id}",
            get(timetable::get_draft).delete(timetable::discard_draft),
        )
        .route("/drafts/{id}/save", post(timetable::save_draft))
        .route(
            "/drafts/{id}/cells/{day}/{slot}",
            put(timetable::set_cell).delete(timetable::clear_cell),
        )
        .route(
            "/drafts/{id}/cells/{day}/{slot}/teachers",
            get(timetable::cell_teachers),
        )
        .route(
            "/drafts/{id}/cells/{day}/{slot}/rooms",
            get(timetable::cell_rooms),
        )
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/timetables", timetable_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
