// src/client/mod.rs

//! Access to the remote school REST API.

pub mod http;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        attempt::{AnswerEntry, AttemptResult, StartQuizResponse, SubmitResult},
        question::QuizSummary,
        timetable::{Classroom, Day, SaveTimetableRequest, Timetable},
        user::Teacher,
    },
    utils::jwt::Session,
};

pub use http::HttpSchoolApi;

/// Query for rooms that are free during one time window.
#[derive(Debug, Clone)]
pub struct RoomQuery<'a> {
    pub school_id: &'a str,
    pub day: Day,
    pub start_time: &'a str,
    pub end_time: &'a str,
    /// Bookings of this timetable are ignored.
    pub exclude_timetable_id: Option<&'a str>,
}

/// The school API operations the portal relies on.
///
/// Every call runs on behalf of `session`, whose bearer token is forwarded.
#[async_trait]
pub trait SchoolApi: Send + Sync {
    async fn list_quizzes(&self, session: &Session) -> Result<Vec<QuizSummary>, AppError>;

    async fn start_quiz(
        &self,
        session: &Session,
        quiz_id: &str,
    ) -> Result<StartQuizResponse, AppError>;

    async fn submit_quiz(
        &self,
        session: &Session,
        quiz_id: &str,
        submission_id: &str,
        answers: Vec<AnswerEntry>,
    ) -> Result<SubmitResult, AppError>;

    async fn quiz_results(
        &self,
        session: &Session,
        quiz_id: &str,
    ) -> Result<Vec<AttemptResult>, AppError>;

    async fn available_classrooms(
        &self,
        session: &Session,
        query: RoomQuery<'_>,
    ) -> Result<Vec<Classroom>, AppError>;

    async fn list_classrooms(
        &self,
        session: &Session,
        school_id: &str,
    ) -> Result<Vec<Classroom>, AppError>;

    async fn list_teachers(&self, session: &Session, school_id: &str)
    -> Result<Vec<Teacher>, AppError>;

    async fn list_timetables(
        &self,
        session: &Session,
        school_id: &str,
    ) -> Result<Vec<Timetable>, AppError>;

    /// Creates a timetable, or replaces `timetable_id` when given.
    async fn save_timetable(
        &self,
        session: &Session,
        timetable_id: Option<&str>,
        body: &SaveTimetableRequest,
    ) -> Result<Timetable, AppError>;
}
