// src/timetable/grid.rs

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    models::timetable::{Day, PeriodType, TimeSlot, Timetable, TimetableEntry},
    timetable::time::{overlaps, parse_hhmm},
};

/// Assignment of one lecture cell. Every field may be unset while editing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        self.subject_id.is_none() && self.teacher_id.is_none() && self.room.is_none()
    }
}

/// The in-progress weekly grid: day -> slot index -> cell.
///
/// Only lecture slots ever hold a cell; break and lunch rows are fixed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftGrid {
    days: Vec<Day>,
    time_slots: Vec<TimeSlot>,
    cells: BTreeMap<Day, BTreeMap<usize, Cell>>,
}

/// School day used when a new draft does not bring its own slots.
pub fn default_time_slots() -> Vec<TimeSlot> {
    vec![
        TimeSlot::new("1", "08:00", "08:45", PeriodType::Lecture),
        TimeSlot::new("2", "08:45", "09:30", PeriodType::Lecture),
        TimeSlot::new("Break", "09:30", "09:45", PeriodType::Break),
        TimeSlot::new("3", "09:45", "10:30", PeriodType::Lecture),
        TimeSlot::new("4", "10:30", "11:15", PeriodType::Lecture),
        TimeSlot::new("Lunch", "11:15", "12:00", PeriodType::Lunch),
        TimeSlot::new("5", "12:00", "12:45", PeriodType::Lecture),
        TimeSlot::new("6", "12:45", "13:30", PeriodType::Lecture),
    ]
}

impl DraftGrid {
    pub fn new(mut days: Vec<Day>, time_slots: Vec<TimeSlot>) -> Self {
        days.sort();
        days.dedup();
        Self {
            days,
            time_slots,
            cells: BTreeMap::new(),
        }
    }

    /// Rebuilds a grid from a stored timetable.
    ///
    /// Slots are the distinct time ranges found in the entries plus every
    /// slot of `time_slots` that does not overlap one of them, ordered by
    /// start time. Lecture periods left empty on every day only exist in
    /// `time_slots`, so they come back from there. Days are the entry days
    /// plus `days`.
    pub fn from_timetable(timetable: &Timetable, days: Vec<Day>, time_slots: Vec<TimeSlot>) -> Self {
        let mut slots: Vec<TimeSlot> = Vec::new();
        for entry in &timetable.entries {
            let known = slots
                .iter()
                .any(|s| s.start_time == entry.start_time && s.end_time == entry.end_time);
            if !known {
                slots.push(TimeSlot {
                    period: entry.period.clone(),
                    start_time: entry.start_time.clone(),
                    end_time: entry.end_time.clone(),
                    period_type: entry.period_type,
                });
            }
        }

        for slot in time_slots {
            let taken = slots.iter().any(|s| {
                (s.start_time == slot.start_time && s.end_time == slot.end_time)
                    || overlaps(&s.start_time, &s.end_time, &slot.start_time, &slot.end_time)
            });
            if !taken {
                slots.push(slot);
            }
        }
        // unparsable start times sort last
        slots.sort_by_key(|s| parse_hhmm(&s.start_time).unwrap_or(u32::MAX));

        let all_days: BTreeSet<Day> = days
            .into_iter()
            .chain(timetable.entries.iter().map(|e| e.day))
            .collect();

        let mut grid = Self::new(all_days.into_iter().collect(), slots);
        for entry in timetable.entries.iter().filter(|e| e.period_type == PeriodType::Lecture) {
            let cell = Cell {
                subject_id: entry.subject_id.clone(),
                teacher_id: entry.teacher_id.clone(),
                room: entry.room.clone(),
            };
            if cell.is_empty() {
                continue;
            }
            let index = grid
                .time_slots
                .iter()
                .position(|s| s.start_time == entry.start_time && s.end_time == entry.end_time);
            if let Some(index) = index {
                grid.cells.entry(entry.day).or_default().insert(index, cell);
            }
        }
        grid
    }

    pub fn days(&self) -> &[Day] {
        &self.days
    }

    pub fn time_slots(&self) -> &[TimeSlot] {
        &self.time_slots
    }

    pub fn slot(&self, index: usize) -> Option<&TimeSlot> {
        self.time_slots.get(index)
    }

    /// The slot at `index` on `day`, provided it can hold an assignment.
    pub fn lecture_slot(&self, day: Day, index: usize) -> Result<&TimeSlot, AppError> {
        if !self.days.contains(&day) {
            return Err(AppError::BadRequest(format!("{} is not part of this timetable", day)));
        }
        let slot = self
            .slot(index)
            .ok_or_else(|| AppError::BadRequest(format!("Slot {} does not exist", index)))?;
        if !slot.is_lecture() {
            return Err(AppError::BadRequest(format!(
                "Slot {} ({}) is not a lecture period",
                index, slot.period
            )));
        }
        Ok(slot)
    }

    pub fn cell(&self, day: Day, index: usize) -> Option<&Cell> {
        self.cells.get(&day).and_then(|row| row.get(&index))
    }

    /// Populated cells of one day, by slot index.
    pub fn cells_on(&self, day: Day) -> impl Iterator<Item = (usize, &Cell)> {
        self.cells
            .get(&day)
            .into_iter()
            .flat_map(|row| row.iter().map(|(i, c)| (*i, c)))
    }

    /// Stores `cell`; an empty cell clears the position.
    pub fn set_cell(&mut self, day: Day, index: usize, cell: Cell) -> Result<(), AppError> {
        self.lecture_slot(day, index)?;
        if cell.is_empty() {
            self.clear_cell(day, index);
        } else {
            self.cells.entry(day).or_default().insert(index, cell);
        }
        Ok(())
    }

    pub fn clear_cell(&mut self, day: Day, index: usize) -> Option<Cell> {
        let row = self.cells.get_mut(&day)?;
        let removed = row.remove(&index);
        if row.is_empty() {
            self.cells.remove(&day);
        }
        removed
    }

    /// Every populated lecture cell must name both a subject and a teacher.
    pub fn ensure_complete(&self) -> Result<(), AppError> {
        for (day, row) in &self.cells {
            for (index, cell) in row {
                if cell.subject_id.is_none() || cell.teacher_id.is_none() {
                    let period = self.slot(*index).map(|s| s.period.as_str()).unwrap_or("?");
                    return Err(AppError::BadRequest(format!(
                        "{} period {}: subject and teacher are both required",
                        day, period
                    )));
                }
            }
        }
        Ok(())
    }

    /// Flattens the grid into the entry list the school API stores.
    ///
    /// Break and lunch rows are emitted for every day so the slot layout
    /// survives a reload; empty lecture cells are skipped.
    pub fn to_entries(&self) -> Vec<TimetableEntry> {
        let mut entries = Vec::new();
        for day in &self.days {
            for (index, slot) in self.time_slots.iter().enumerate() {
                let cell = if slot.is_lecture() {
                    match self.cell(*day, index) {
                        Some(cell) => cell.clone(),
                        None => continue,
                    }
                } else {
                    Cell::default()
                };
                entries.push(TimetableEntry {
                    day: *day,
                    period: slot.period.clone(),
                    start_time: slot.start_time.clone(),
                    end_time: slot.end_time.clone(),
                    teacher_id: cell.teacher_id,
                    subject_id: cell.subject_id,
                    room: cell.room,
                    period_type: slot.period_type,
                });
            }
        }
        entries
    }
}
