// src/timetable/checker.rs

use crate::{
    error::AppError,
    models::{
        timetable::{Day, Timetable},
        user::{Teacher, TeacherAvailability},
    },
    timetable::{grid::DraftGrid, time::overlaps},
};

/// Teacher availability for a draft, checked against the school's other
/// timetables and the draft itself.
///
/// Advisory only: nothing is reserved, the school API validates on save.
pub struct ConflictChecker<'a> {
    grid: &'a DraftGrid,
    others: &'a [Timetable],
}

impl<'a> ConflictChecker<'a> {
    /// `others` must already exclude the timetable being edited.
    pub fn new(grid: &'a DraftGrid, others: &'a [Timetable]) -> Self {
        Self { grid, others }
    }

    /// Whether `teacher_id` can take slot `slot_index` on `day`.
    ///
    /// Non-lecture and unknown slots never constrain. Otherwise any
    /// overlapping entry of another timetable, or any other cell of the
    /// draft on the same day, held by the same teacher makes them busy.
    pub fn is_teacher_free(&self, teacher_id: &str, day: Day, slot_index: usize) -> bool {
        let Some(slot) = self.grid.slot(slot_index) else {
            return true;
        };
        if !slot.is_lecture() {
            return true;
        }

        let booked_elsewhere = self
            .others
            .iter()
            .flat_map(|t| t.entries.iter())
            .filter(|e| e.day == day && e.teacher_id.as_deref() == Some(teacher_id))
            .any(|e| overlaps(&slot.start_time, &slot.end_time, &e.start_time, &e.end_time));
        if booked_elsewhere {
            return false;
        }

        !self
            .grid
            .cells_on(day)
            .filter(|(index, cell)| {
                *index != slot_index && cell.teacher_id.as_deref() == Some(teacher_id)
            })
            .filter_map(|(index, _)| self.grid.slot(index))
            .any(|other| overlaps(&slot.start_time, &slot.end_time, &other.start_time, &other.end_time))
    }

    /// Teacher dropdown for one cell, every candidate flagged free or busy.
    pub fn teacher_options(
        &self,
        teachers: &[Teacher],
        day: Day,
        slot_index: usize,
    ) -> Vec<TeacherAvailability> {
        teachers
            .iter()
            .map(|t| TeacherAvailability {
                id: t.id.clone(),
                name: t.name.clone(),
                available: self.is_teacher_free(&t.id, day, slot_index),
            })
            .collect()
    }

    /// Re-runs the teacher check over every populated cell.
    pub fn ensure_no_conflicts(&self) -> Result<(), AppError> {
        for day in self.grid.days() {
            for (index, cell) in self.grid.cells_on(*day) {
                let Some(teacher_id) = cell.teacher_id.as_deref() else {
                    continue;
                };
                if !self.is_teacher_free(teacher_id, *day, index) {
                    let period = self.grid.slot(index).map(|s| s.period.as_str()).unwrap_or("?");
                    return Err(AppError::Conflict(format!(
                        "Teacher {} is already teaching on {} during period {}",
                        teacher_id, day, period
                    )));
                }
            }
        }
        Ok(())
    }
}
