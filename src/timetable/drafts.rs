// src/timetable/drafts.rs

use std::{collections::HashMap, sync::Arc, time::Duration};

use serde::Serialize;
use tokio::{
    sync::{Mutex, MutexGuard},
    time::Instant,
};
use uuid::Uuid;

use crate::{
    client::SchoolApi,
    error::AppError,
    models::{
        timetable::{Day, OpenDraftRequest, SaveTimetableRequest, SetCellRequest, Timetable},
        user::{Teacher, TeacherAvailability},
    },
    timetable::{
        checker::ConflictChecker,
        grid::{Cell, DraftGrid, default_time_slots},
        rooms::{RoomOptions, cache_key, find_rooms},
    },
    utils::jwt::Session,
};

/// One admin's in-progress timetable edit.
struct TimetableDraft {
    owner: String,
    school_id: String,
    class_id: String,
    name: Option<String>,
    /// Timetable being replaced; `None` for a new one.
    editing_id: Option<String>,
    grid: DraftGrid,
    /// Every other timetable of the school, snapshot taken when the draft opened.
    others: Vec<Timetable>,
    teachers: Vec<Teacher>,
    rooms: HashMap<String, RoomOptions>,
    last_used: Instant,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftView {
    pub id: Uuid,
    pub school_id: String,
    pub class_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timetable_id: Option<String>,
    pub grid: DraftGrid,
    pub teachers: Vec<Teacher>,
}

impl TimetableDraft {
    fn view(&self, id: Uuid) -> DraftView {
        DraftView {
            id,
            school_id: self.school_id.clone(),
            class_id: self.class_id.clone(),
            name: self.name.clone(),
            timetable_id: self.editing_id.clone(),
            grid: self.grid.clone(),
            teachers: self.teachers.clone(),
        }
    }

    fn checker(&self) -> ConflictChecker<'_> {
        ConflictChecker::new(&self.grid, &self.others)
    }
}

/// In-memory timetable drafts, keyed by a random id handed to the editor.
///
/// Drafts live until saved, discarded or left untouched for `idle_ttl`.
/// Nothing is reserved on the school API while editing, so the last save wins.
pub struct DraftStore {
    api: Arc<dyn SchoolApi>,
    idle_ttl: Duration,
    drafts: Mutex<HashMap<Uuid, TimetableDraft>>,
}

fn owned<'a>(
    drafts: &'a mut HashMap<Uuid, TimetableDraft>,
    id: Uuid,
    session: &Session,
) -> Result<&'a mut TimetableDraft, AppError> {
    let draft = drafts
        .get_mut(&id)
        .filter(|d| d.owner == session.user_id)
        .ok_or_else(|| AppError::NotFound(format!("Draft {} not found", id)))?;
    draft.last_used = Instant::now();
    Ok(draft)
}

impl DraftStore {
    pub fn new(api: Arc<dyn SchoolApi>, idle_ttl: Duration) -> Self {
        Self {
            api,
            idle_ttl,
            drafts: Mutex::new(HashMap::new()),
        }
    }

    /// Locks the drafts after dropping the ones idle for longer than `idle_ttl`.
    async fn live(&self) -> MutexGuard<'_, HashMap<Uuid, TimetableDraft>> {
        let mut drafts = self.drafts.lock().await;
        let before = drafts.len();
        drafts.retain(|_, d| d.last_used.elapsed() < self.idle_ttl);
        if drafts.len() < before {
            tracing::info!("Dropped {} idle drafts", before - drafts.len());
        }
        drafts
    }

    /// Opens a draft. Loads the school's timetables and teachers together;
    /// the one being edited seeds the grid, the rest feed conflict checks.
    pub async fn open(&self, session: &Session, req: OpenDraftRequest) -> Result<DraftView, AppError> {
        let school_id = session.school_or(req.school_id.as_deref())?;

        let (timetables, teachers) = tokio::try_join!(
            self.api.list_timetables(session, &school_id),
            self.api.list_teachers(session, &school_id),
        )?;

        let (editing, others): (Vec<Timetable>, Vec<Timetable>) = timetables
            .into_iter()
            .partition(|t| Some(&t.id) == req.timetable_id.as_ref());

        let editing = match (&req.timetable_id, editing.into_iter().next()) {
            (Some(id), None) => {
                return Err(AppError::NotFound(format!("Timetable {} not found", id)));
            }
            (_, found) => found,
        };

        let class_id = req
            .class_id
            .clone()
            .or_else(|| editing.as_ref().and_then(|t| t.class_id.clone()))
            .ok_or_else(|| AppError::BadRequest("classId is required".to_string()))?;

        let days = req.days.unwrap_or_else(|| Day::WEEKDAYS.to_vec());
        let time_slots = req.time_slots.unwrap_or_else(default_time_slots);
        let grid = match &editing {
            Some(timetable) => DraftGrid::from_timetable(timetable, days, time_slots),
            None => DraftGrid::new(days, time_slots),
        };

        let draft = TimetableDraft {
            owner: session.user_id.clone(),
            school_id,
            class_id,
            name: req.name.or_else(|| editing.as_ref().and_then(|t| t.name.clone())),
            editing_id: editing.map(|t| t.id),
            grid,
            others,
            teachers,
            rooms: HashMap::new(),
            last_used: Instant::now(),
        };

        let id = Uuid::new_v4();
        let view = draft.view(id);
        tracing::info!(
            "Draft {} opened by {} for class {} ({} other timetables)",
            id,
            session.user_id,
            view.class_id,
            draft.others.len()
        );
        self.live().await.insert(id, draft);
        Ok(view)
    }

    pub async fn get(&self, session: &Session, id: Uuid) -> Result<DraftView, AppError> {
        let mut drafts = self.live().await;
        Ok(owned(&mut drafts, id, session)?.view(id))
    }

    pub async fn discard(&self, session: &Session, id: Uuid) -> Result<(), AppError> {
        let mut drafts = self.live().await;
        owned(&mut drafts, id, session)?;
        drafts.remove(&id);
        tracing::info!("Draft {} discarded by {}", id, session.user_id);
        Ok(())
    }

    /// Assigns one lecture cell. A teacher who is busy at that time is refused.
    pub async fn set_cell(
        &self,
        session: &Session,
        id: Uuid,
        day: Day,
        slot_index: usize,
        req: SetCellRequest,
    ) -> Result<DraftView, AppError> {
        let mut drafts = self.live().await;
        let draft = owned(&mut drafts, id, session)?;
        draft.grid.lecture_slot(day, slot_index)?;

        if let Some(teacher_id) = req.teacher_id.as_deref() {
            if !draft.checker().is_teacher_free(teacher_id, day, slot_index) {
                return Err(AppError::Conflict(format!(
                    "Teacher {} is not available at that time",
                    teacher_id
                )));
            }
        }

        let cell = Cell {
            subject_id: req.subject_id,
            teacher_id: req.teacher_id,
            room: req.room,
        };
        draft.grid.set_cell(day, slot_index, cell)?;
        Ok(draft.view(id))
    }

    pub async fn clear_cell(
        &self,
        session: &Session,
        id: Uuid,
        day: Day,
        slot_index: usize,
    ) -> Result<DraftView, AppError> {
        let mut drafts = self.live().await;
        let draft = owned(&mut drafts, id, session)?;
        draft.grid.lecture_slot(day, slot_index)?;
        draft.grid.clear_cell(day, slot_index);
        Ok(draft.view(id))
    }

    pub async fn teacher_options(
        &self,
        session: &Session,
        id: Uuid,
        day: Day,
        slot_index: usize,
    ) -> Result<Vec<TeacherAvailability>, AppError> {
        let mut drafts = self.live().await;
        let draft = owned(&mut drafts, id, session)?;
        draft.grid.lecture_slot(day, slot_index)?;
        Ok(draft.checker().teacher_options(&draft.teachers, day, slot_index))
    }

    /// Rooms for one cell, cached per day and slot for the life of the draft.
    pub async fn room_options(
        &self,
        session: &Session,
        id: Uuid,
        day: Day,
        slot_index: usize,
    ) -> Result<RoomOptions, AppError> {
        let key = cache_key(day, slot_index);
        let (school_id, slot, editing_id) = {
            let mut drafts = self.live().await;
            let draft = owned(&mut drafts, id, session)?;
            let slot = draft.grid.lecture_slot(day, slot_index)?.clone();
            if let Some(cached) = draft.rooms.get(&key) {
                return Ok(cached.clone());
            }
            (draft.school_id.clone(), slot, draft.editing_id.clone())
        };

        let options = find_rooms(
            self.api.as_ref(),
            session,
            &school_id,
            day,
            &slot,
            editing_id.as_deref(),
        )
        .await?;

        if let Some(draft) = self.live().await.get_mut(&id) {
            draft.rooms.insert(key, options.clone());
        }
        Ok(options)
    }

    /// Validates the draft and sends it to the school API.
    ///
    /// The draft is dropped once the save succeeds and kept otherwise; a
    /// rejection from the school API comes back as a single message.
    pub async fn save(&self, session: &Session, id: Uuid) -> Result<Timetable, AppError> {
        let (editing_id, body) = {
            let mut drafts = self.live().await;
            let draft = owned(&mut drafts, id, session)?;
            draft.grid.ensure_complete()?;
            draft.checker().ensure_no_conflicts()?;
            let body = SaveTimetableRequest {
                school_id: draft.school_id.clone(),
                class_id: draft.class_id.clone(),
                name: draft.name.clone(),
                entries: draft.grid.to_entries(),
            };
            (draft.editing_id.clone(), body)
        };

        let saved = match self
            .api
            .save_timetable(session, editing_id.as_deref(), &body)
            .await
        {
            Ok(saved) => saved,
            Err(e) => {
                tracing::warn!("Saving draft {} failed: {}", id, e);
                return Err(e);
            }
        };

        self.live().await.remove(&id);
        tracing::info!(
            "Draft {} saved as timetable {} ({} entries)",
            id,
            saved.id,
            body.entries.len()
        );
        Ok(saved)
    }
}
