// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use validator::Validate;

use crate::{client::SchoolApi, error::AppError, quiz::runner::QuizRunner, utils::jwt::Session};

/// DTO for toggling one option of the running attempt.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SelectAnswerRequest {
    #[validate(length(min = 1, max = 100))]
    pub question_id: String,
    pub option_index: usize,
}

/// Lists the student's quizzes with their attempt counters.
pub async fn list_quizzes(
    State(api): State<Arc<dyn SchoolApi>>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, AppError> {
    let quizzes = api.list_quizzes(&session).await?;
    Ok(Json(quizzes))
}

/// Current attempt (if any) plus the outcome of the last one.
pub async fn get_attempt(
    State(runner): State<Arc<QuizRunner>>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(runner.status(&session.user_id).await))
}

/// Starts an attempt and its countdown.
///
/// * 409 if an attempt is already running.
/// * 410 if the school API hands out an attempt that has already expired.
pub async fn start_quiz(
    State(runner): State<Arc<QuizRunner>>,
    Extension(session): Extension<Session>,
    Path(quiz_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = runner.start(&session, &quiz_id).await?;
    Ok((StatusCode::CREATED, Json(attempt)))
}

pub async fn select_answer(
    State(runner): State<Arc<QuizRunner>>,
    Extension(session): Extension<Session>,
    Json(payload): Json<SelectAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let attempt = runner
        .select(&session.user_id, &payload.question_id, payload.option_index)
        .await?;
    Ok(Json(attempt))
}

/// Submits the running attempt; the answer sheet covers every question.
pub async fn submit_attempt(
    State(runner): State<Arc<QuizRunner>>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = runner.submit(&session.user_id).await?;
    Ok(Json(outcome))
}

pub async fn cancel_attempt(
    State(runner): State<Arc<QuizRunner>>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, AppError> {
    runner.cancel(&session.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Past attempts of one quiz.
pub async fn get_results(
    State(api): State<Arc<dyn SchoolApi>>,
    Extension(session): Extension<Session>,
    Path(quiz_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let results = api.quiz_results(&session, &quiz_id).await?;
    Ok(Json(results))
}
