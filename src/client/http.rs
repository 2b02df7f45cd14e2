// src/client/http.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    client::{RoomQuery, SchoolApi},
    error::AppError,
    models::{
        attempt::{AnswerEntry, AttemptResult, StartQuizResponse, SubmitQuizRequest, SubmitResult},
        question::QuizSummary,
        timetable::{Classroom, SaveTimetableRequest, Timetable},
        user::Teacher,
    },
    utils::jwt::Session,
};

/// `SchoolApi` over HTTPS with one shared connection pool.
#[derive(Clone)]
pub struct HttpSchoolApi {
    http: Client,
    base_url: Url,
}

impl HttpSchoolApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            AppError::InternalServerError(format!("Invalid SCHOOL_API_URL '{}': {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::InternalServerError(format!(
                "SCHOOL_API_URL '{}' cannot be used as a base",
                base_url
            )));
        }

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        Ok(Self { http, base_url })
    }

    /// Base URL with `segments` appended, each one percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Sends the request with the caller's bearer token and decodes the body.
    ///
    /// Non-2xx responses become `AppError::Upstream`, carrying the `message`
    /// (or `error`) field of the body when there is one.
    async fn send<T: DeserializeOwned>(
        &self,
        session: &Session,
        request: RequestBuilder,
    ) -> Result<T, AppError> {
        let response = request.bearer_auth(&session.token).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| {
                    v.get("message")
                        .or_else(|| v.get("error"))
                        .and_then(|m| m.as_str())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("School API error")
                        .to_string()
                });
            tracing::debug!("School API answered {}: {}", status, message);
            return Err(AppError::Upstream(status.as_u16(), message));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::error!("Unexpected School API payload: {:?}", e);
            AppError::Upstream(502, format!("Unexpected School API payload: {}", e))
        })
    }
}

#[async_trait]
impl SchoolApi for HttpSchoolApi {
    async fn list_quizzes(&self, session: &Session) -> Result<Vec<QuizSummary>, AppError> {
        let url = self.endpoint(&["students", &session.user_id, "quizzes"]);
        self.send(session, self.http.get(url)).await
    }

    async fn start_quiz(
        &self,
        session: &Session,
        quiz_id: &str,
    ) -> Result<StartQuizResponse, AppError> {
        let url = self.endpoint(&["students", &session.user_id, "quizzes", quiz_id, "start"]);
        self.send(session, self.http.post(url)).await
    }

    async fn submit_quiz(
        &self,
        session: &Session,
        quiz_id: &str,
        submission_id: &str,
        answers: Vec<AnswerEntry>,
    ) -> Result<SubmitResult, AppError> {
        let url = self.endpoint(&[
            "students",
            &session.user_id,
            "quizzes",
            quiz_id,
            "submit",
            submission_id,
        ]);
        let body = SubmitQuizRequest { answers };
        self.send(session, self.http.post(url).json(&body)).await
    }

    async fn quiz_results(
        &self,
        session: &Session,
        quiz_id: &str,
    ) -> Result<Vec<AttemptResult>, AppError> {
        let url = self.endpoint(&["students", &session.user_id, "quizzes", quiz_id, "results"]);
        self.send(session, self.http.get(url)).await
    }

    async fn available_classrooms(
        &self,
        session: &Session,
        query: RoomQuery<'_>,
    ) -> Result<Vec<Classroom>, AppError> {
        let mut url = self.endpoint(&["classrooms", "availability"]);
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("schoolId", query.school_id)
                .append_pair("day", query.day.as_str())
                .append_pair("startTime", query.start_time)
                .append_pair("endTime", query.end_time);
            if let Some(id) = query.exclude_timetable_id {
                pairs.append_pair("excludeTimetableId", id);
            }
        }
        self.send(session, self.http.get(url)).await
    }

    async fn list_classrooms(
        &self,
        session: &Session,
        school_id: &str,
    ) -> Result<Vec<Classroom>, AppError> {
        let mut url = self.endpoint(&["classrooms"]);
        url.query_pairs_mut().append_pair("schoolId", school_id);
        self.send(session, self.http.get(url)).await
    }

    async fn list_teachers(
        &self,
        session: &Session,
        school_id: &str,
    ) -> Result<Vec<Teacher>, AppError> {
        let mut url = self.endpoint(&["teachers"]);
        url.query_pairs_mut().append_pair("schoolId", school_id);
        self.send(session, self.http.get(url)).await
    }

    async fn list_timetables(
        &self,
        session: &Session,
        school_id: &str,
    ) -> Result<Vec<Timetable>, AppError> {
        let mut url = self.endpoint(&["timetables"]);
        url.query_pairs_mut().append_pair("schoolId", school_id);
        self.send(session, self.http.get(url)).await
    }

    async fn save_timetable(
        &self,
        session: &Session,
        timetable_id: Option<&str>,
        body: &SaveTimetableRequest,
    ) -> Result<Timetable, AppError> {
        let request = match timetable_id {
            Some(id) => self.http.put(self.endpoint(&["timetables", id])),
            None => self.http.post(self.endpoint(&["timetables"])),
        };
        self.send(session, request.json(body)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_appends_encoded_segments() {
        let api = HttpSchoolApi::new("http://school.test/api/", Duration::from_secs(1)).unwrap();
        let url = api.endpoint(&["students", "s 1", "quizzes"]);
        assert_eq!(url.as_str(), "http://school.test/api/students/s%201/quizzes");

        let api = HttpSchoolApi::new("http://school.test", Duration::from_secs(1)).unwrap();
        assert_eq!(api.endpoint(&["timetables"]).as_str(), "http://school.test/timetables");
    }

    #[test]
    fn rejects_unusable_base_urls() {
        assert!(HttpSchoolApi::new("not a url", Duration::from_secs(1)).is_err());
        assert!(HttpSchoolApi::new("mailto:office@school.test", Duration::from_secs(1)).is_err());
    }
}
