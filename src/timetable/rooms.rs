// src/timetable/rooms.rs

use serde::Serialize;

use crate::{
    client::{RoomQuery, SchoolApi},
    error::AppError,
    models::timetable::{Classroom, Day, TimeSlot},
    utils::jwt::Session,
};

/// Room dropdown for one cell.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomOptions {
    pub rooms: Vec<Classroom>,
    /// False when the list is the unfiltered fallback and may contain
    /// rooms that are already booked.
    pub filtered: bool,
}

/// Key under which a draft caches the rooms of one cell.
pub fn cache_key(day: Day, slot_index: usize) -> String {
    format!("{}-{}", day, slot_index)
}

/// Rooms free during `slot` on `day`, ignoring bookings of `exclude_timetable_id`.
///
/// An empty or failed availability query falls back to every active room
/// of the school, so the dropdown is never a dead end. The list is then
/// advisory only; the school API still rejects double bookings on save.
pub async fn find_rooms(
    api: &dyn SchoolApi,
    session: &Session,
    school_id: &str,
    day: Day,
    slot: &TimeSlot,
    exclude_timetable_id: Option<&str>,
) -> Result<RoomOptions, AppError> {
    if !slot.is_lecture() {
        return Ok(RoomOptions {
            rooms: Vec::new(),
            filtered: true,
        });
    }

    let query = RoomQuery {
        school_id,
        day,
        start_time: &slot.start_time,
        end_time: &slot.end_time,
        exclude_timetable_id,
    };

    match api.available_classrooms(session, query).await {
        Ok(rooms) if !rooms.is_empty() => {
            return Ok(RoomOptions {
                rooms,
                filtered: true,
            });
        }
        Ok(_) => tracing::info!(
            "No free rooms reported for {} {}-{}, listing all active rooms",
            day,
            slot.start_time,
            slot.end_time
        ),
        Err(e) => tracing::warn!(
            "Room availability lookup failed for {} {}-{}: {}; listing all active rooms",
            day,
            slot.start_time,
            slot.end_time,
            e
        ),
    }

    let rooms = api
        .list_classrooms(session, school_id)
        .await?
        .into_iter()
        .filter(|room| room.is_active)
        .collect();

    Ok(RoomOptions {
        rooms,
        filtered: false,
    })
}
