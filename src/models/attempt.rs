// src/models/attempt.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    models::question::Quiz,
    utils::lenient::{opt_string_or_number, string_or_number},
};

/// Expiry as the school API sends it: an ISO-8601 string or epoch milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExpiryValue {
    EpochMs(i64),
    Iso(String),
}

impl ExpiryValue {
    pub fn to_epoch_ms(&self) -> Result<i64, AppError> {
        match self {
            ExpiryValue::EpochMs(ms) => Ok(*ms),
            ExpiryValue::Iso(text) => DateTime::parse_from_rfc3339(text)
                .map(|dt| dt.timestamp_millis())
                .map_err(|e| {
                    AppError::Upstream(502, format!("Invalid expiresAt '{}': {}", text, e))
                }),
        }
    }
}

/// Response of `POST /students/{id}/quizzes/{quizId}/start`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartQuizResponse {
    #[serde(deserialize_with = "string_or_number")]
    pub submission_id: String,

    #[serde(default)]
    pub attempt_no: u32,

    #[serde(default)]
    pub expires_at: Option<ExpiryValue>,

    #[serde(default)]
    pub expires_at_epoch_ms: Option<i64>,

    pub quiz: Quiz,
}

/// A started attempt with its expiry normalized to epoch milliseconds.
#[derive(Debug, Clone)]
pub struct AttemptGrant {
    pub quiz_id: String,
    pub submission_id: String,
    pub attempt_no: u32,
    pub expires_at_ms: i64,
    pub quiz: Quiz,
}

impl StartQuizResponse {
    /// Collapses the two expiry encodings into one; `expiresAtEpochMs` wins
    /// when both are present.
    pub fn into_grant(self, quiz_id: &str) -> Result<AttemptGrant, AppError> {
        let expires_at_ms = match (self.expires_at_epoch_ms, &self.expires_at) {
            (Some(ms), _) => ms,
            (None, Some(value)) => value.to_epoch_ms()?,
            (None, None) => {
                return Err(AppError::Upstream(
                    502,
                    "Start response carries no expiry".to_string(),
                ));
            }
        };

        Ok(AttemptGrant {
            quiz_id: quiz_id.to_string(),
            submission_id: self.submission_id,
            attempt_no: self.attempt_no,
            expires_at_ms,
            quiz: self.quiz,
        })
    }
}

/// One answer line of a submission. Unanswered questions carry `selected: []`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEntry {
    pub question_id: String,
    pub selected: Vec<usize>,
}

/// Body of `POST .../submit/{submissionId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitQuizRequest {
    pub answers: Vec<AnswerEntry>,
}

/// Grading returned by the school API after a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResult {
    pub score: f64,
    pub total_points: f64,
    pub passed: bool,
}

/// One past attempt, as listed by `GET .../results`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptResult {
    pub attempt_no: u32,
    pub score: f64,
    pub total_points: f64,
    pub passed: bool,

    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "opt_string_or_number", skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn start_body(expiry: serde_json::Value) -> StartQuizResponse {
        let mut body = json!({
            "submissionId": 99,
            "attemptNo": 2,
            "quiz": { "title": "T", "questions": [] }
        });
        for (k, v) in expiry.as_object().unwrap() {
            body[k] = v.clone();
        }
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn iso_expiry_is_normalized() {
        let grant = start_body(json!({ "expiresAt": "2026-01-01T00:00:10Z" }))
            .into_grant("qz")
            .unwrap();
        assert_eq!(grant.expires_at_ms, 1_767_225_610_000);
        assert_eq!(grant.submission_id, "99");
        assert_eq!(grant.attempt_no, 2);
    }

    #[test]
    fn numeric_expires_at_is_epoch_ms() {
        let grant = start_body(json!({ "expiresAt": 1_700_000_000_000_i64 }))
            .into_grant("qz")
            .unwrap();
        assert_eq!(grant.expires_at_ms, 1_700_000_000_000);
    }

    #[test]
    fn epoch_field_wins_over_iso() {
        let grant = start_body(json!({
            "expiresAt": "2026-01-01T00:00:10Z",
            "expiresAtEpochMs": 5000
        }))
        .into_grant("qz")
        .unwrap();
        assert_eq!(grant.expires_at_ms, 5000);
    }

    #[test]
    fn missing_or_garbled_expiry_is_an_upstream_error() {
        assert!(matches!(
            start_body(json!({})).into_grant("qz"),
            Err(AppError::Upstream(502, _))
        ));
        assert!(matches!(
            start_body(json!({ "expiresAt": "tomorrow" })).into_grant("qz"),
            Err(AppError::Upstream(502, _))
        ));
    }
}
