// src/handlers/timetable.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    client::SchoolApi,
    error::AppError,
    models::timetable::{Day, OpenDraftRequest, SetCellRequest},
    timetable::drafts::DraftStore,
    utils::jwt::Session,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolQuery {
    pub school_id: Option<String>,
}

/// Lists the timetables of a school (the caller's by default).
pub async fn list_timetables(
    State(api): State<Arc<dyn SchoolApi>>,
    Extension(session): Extension<Session>,
    Query(query): Query<SchoolQuery>,
) -> Result<impl IntoResponse, AppError> {
    let school_id = session.school_or(query.school_id.as_deref())?;
    let timetables = api.list_timetables(&session, &school_id).await?;
    Ok(Json(timetables))
}

/// Opens a draft, either empty or seeded from `timetableId`.
pub async fn open_draft(
    State(drafts): State<Arc<DraftStore>>,
    Extension(session): Extension<Session>,
    Json(payload): Json<OpenDraftRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let draft = drafts.open(&session, payload).await?;
    Ok((StatusCode::CREATED, Json(draft)))
}

pub async fn get_draft(
    State(drafts): State<Arc<DraftStore>>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(drafts.get(&session, id).await?))
}

pub async fn discard_draft(
    State(drafts): State<Arc<DraftStore>>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    drafts.discard(&session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Assigns subject, teacher and room of one lecture cell.
/// Busy teachers are refused with 409.
pub async fn set_cell(
    State(drafts): State<Arc<DraftStore>>,
    Extension(session): Extension<Session>,
    Path((id, day, slot)): Path<(Uuid, Day, usize)>,
    Json(payload): Json<SetCellRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let draft = drafts.set_cell(&session, id, day, slot, payload).await?;
    Ok(Json(draft))
}

pub async fn clear_cell(
    State(drafts): State<Arc<DraftStore>>,
    Extension(session): Extension<Session>,
    Path((id, day, slot)): Path<(Uuid, Day, usize)>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(drafts.clear_cell(&session, id, day, slot).await?))
}

/// Teacher dropdown for a cell, each teacher flagged available or not.
pub async fn cell_teachers(
    State(drafts): State<Arc<DraftStore>>,
    Extension(session): Extension<Session>,
    Path((id, day, slot)): Path<(Uuid, Day, usize)>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(drafts.teacher_options(&session, id, day, slot).await?))
}

/// Room dropdown for a cell (advisory; see `find_rooms`).
pub async fn cell_rooms(
    State(drafts): State<Arc<DraftStore>>,
    Extension(session): Extension<Session>,
    Path((id, day, slot)): Path<(Uuid, Day, usize)>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(drafts.room_options(&session, id, day, slot).await?))
}

pub async fn save_draft(
    State(drafts): State<Arc<DraftStore>>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let saved = drafts.save(&session, id).await?;
    Ok(Json(saved))
}
