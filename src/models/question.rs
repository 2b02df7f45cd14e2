// src/models/question.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::lenient::{opt_string_or_number, string_or_number};

/// How many options a student may pick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionType {
    #[default]
    #[serde(
        rename = "single-choice",
        alias = "single",
        alias = "single_choice",
        alias = "SINGLE_CHOICE"
    )]
    SingleChoice,

    #[serde(
        rename = "multi-choice",
        alias = "multiple",
        alias = "multi_choice",
        alias = "MULTI_CHOICE"
    )]
    MultiChoice,
}

/// One question of a quiz snapshot, as handed out by the school API.
/// Snapshots never contain the correct answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    #[serde(alias = "question")]
    pub text: String,

    /// Mapped from the JSON field `type` since `type` is a reserved keyword in Rust.
    #[serde(rename = "type", default)]
    pub question_type: QuestionType,

    /// Ordered option labels; selections refer to them by index.
    #[serde(default)]
    pub options: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<f64>,
}

impl Question {
    pub fn is_multi_choice(&self) -> bool {
        self.question_type == QuestionType::MultiChoice
    }
}

/// Quiz snapshot returned when an attempt starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    #[serde(default, deserialize_with = "opt_string_or_number", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Row of the student's quiz list. Unknown fields are passed through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummary {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts_used: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
