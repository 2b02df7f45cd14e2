// src/models/user.rs

use serde::{Deserialize, Serialize};

use crate::utils::lenient::string_or_number;

/// Portal roles carried in the JWT `role` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
    Parent,
}

/// A teacher as listed by the school API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// Subjects the teacher is qualified for, when the school API reports them.
    #[serde(default)]
    pub subject_ids: Vec<String>,
}

/// Teacher dropdown entry for one timetable cell.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherAvailability {
    pub id: String,
    pub name: String,
    pub available: bool,
}
