// src/models/timetable.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::{
    timetable::time::parse_hhmm,
    utils::lenient::{opt_string_or_number, string_or_number},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    #[serde(alias = "MONDAY", alias = "monday")]
    Monday,
    #[serde(alias = "TUESDAY", alias = "tuesday")]
    Tuesday,
    #[serde(alias = "WEDNESDAY", alias = "wednesday")]
    Wednesday,
    #[serde(alias = "THURSDAY", alias = "thursday")]
    Thursday,
    #[serde(alias = "FRIDAY", alias = "friday")]
    Friday,
    #[serde(alias = "SATURDAY", alias = "saturday")]
    Saturday,
    #[serde(alias = "SUNDAY", alias = "sunday")]
    Sunday,
}

impl Day {
    pub const WEEKDAYS: [Day; 5] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
            Day::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PeriodType {
    #[default]
    Lecture,
    Break,
    Lunch,
}

/// One row of the weekly grid: a named time range shared by every day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    #[validate(length(min = 1, max = 50))]
    #[serde(deserialize_with = "string_or_number")]
    pub period: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(rename = "type", default)]
    pub period_type: PeriodType,
}

impl TimeSlot {
    pub fn new(period: &str, start: &str, end: &str, period_type: PeriodType) -> Self {
        Self {
            period: period.to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            period_type,
        }
    }

    pub fn is_lecture(&self) -> bool {
        self.period_type == PeriodType::Lecture
    }
}

/// Checks a user-supplied slot list: non-empty, every time `HH:MM`, start before end.
pub fn validate_time_slots(slots: &[TimeSlot]) -> Result<(), ValidationError> {
    if slots.is_empty() {
        return Err(ValidationError::new("time_slots_cannot_be_empty"));
    }
    for slot in slots {
        match (parse_hhmm(&slot.start_time), parse_hhmm(&slot.end_time)) {
            (Some(start), Some(end)) if start < end => {}
            (Some(_), Some(_)) => return Err(ValidationError::new("slot_ends_before_it_starts")),
            _ => return Err(ValidationError::new("slot_time_must_be_hh_mm")),
        }
    }
    Ok(())
}

/// Flat timetable entry as stored by the school API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableEntry {
    pub day: Day,

    #[serde(deserialize_with = "string_or_number")]
    pub period: String,

    #[serde(default)]
    pub start_time: String,

    #[serde(default)]
    pub end_time: String,

    #[serde(default, deserialize_with = "opt_string_or_number", skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<String>,

    #[serde(default, deserialize_with = "opt_string_or_number", skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,

    #[serde(default, deserialize_with = "opt_string_or_number", skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,

    #[serde(default)]
    pub period_type: PeriodType,
}

/// A class timetable as returned by `GET /timetables`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timetable {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    #[serde(default, deserialize_with = "opt_string_or_number", skip_serializing_if = "Option::is_none")]
    pub school_id: Option<String>,

    #[serde(default, deserialize_with = "opt_string_or_number", skip_serializing_if = "Option::is_none")]
    pub class_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub entries: Vec<TimetableEntry>,
}

/// Body of `POST /timetables` and `PUT /timetables/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveTimetableRequest {
    pub school_id: String,
    pub class_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub entries: Vec<TimetableEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classroom {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// DTO for opening a timetable draft, empty or from an existing timetable.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OpenDraftRequest {
    /// Defaults to the school of the caller's token.
    #[validate(length(min = 1, max = 100))]
    pub school_id: Option<String>,

    /// Required unless the edited timetable already names its class.
    #[validate(length(min = 1, max = 100))]
    pub class_id: Option<String>,

    /// Timetable to edit; a new timetable is drafted when absent.
    #[validate(length(min = 1, max = 100))]
    pub timetable_id: Option<String>,

    #[validate(length(max = 100))]
    pub name: Option<String>,

    /// Defaults to Monday through Friday.
    pub days: Option<Vec<Day>>,

    #[validate(custom(function = validate_time_slots))]
    pub time_slots: Option<Vec<TimeSlot>>,
}

/// DTO for assigning one cell. Omitted fields are cleared.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SetCellRequest {
    #[validate(length(min = 1, max = 100))]
    pub subject_id: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub teacher_id: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub room: Option<String>,
}
