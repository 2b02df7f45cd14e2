// tests/common/mod.rs

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use portal::{
    client::HttpSchoolApi,
    config::Config,
    models::user::Role,
    routes,
    state::AppState,
    utils::jwt::sign_jwt,
};
use serde_json::{Value, json};

pub const TEST_SECRET: &str = "test_secret_for_integration_tests";
pub const SCHOOL_ID: &str = "sch-1";

/// A recorded quiz submission: (quiz id, submission id, body).
pub type Submission = (String, String, Value);

/// In-process stand-in for the school REST API. Records what it receives.
pub struct MockSchool {
    /// Offset of `expiresAt` from "now" handed out by the start endpoint.
    pub quiz_ttl_ms: AtomicI64,
    pub fail_next_submits: AtomicUsize,
    pub starts: AtomicUsize,
    pub submits: Mutex<Vec<Submission>>,
    pub tokens: Mutex<Vec<String>>,

    pub available_rooms: Mutex<Vec<Value>>,
    /// Makes `/classrooms/availability` answer 500.
    pub fail_availability: AtomicBool,
    pub availability_queries: Mutex<Vec<HashMap<String, String>>>,
    pub classrooms: Vec<Value>,
    pub teachers: Vec<Value>,
    pub timetables: Vec<Value>,
    pub saved: Mutex<Vec<(Option<String>, Value)>>,
    pub reject_save: Mutex<Option<String>>,
}

impl MockSchool {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            quiz_ttl_ms: AtomicI64::new(600_000),
            fail_next_submits: AtomicUsize::new(0),
            starts: AtomicUsize::new(0),
            submits: Mutex::new(Vec::new()),
            tokens: Mutex::new(Vec::new()),
            available_rooms: Mutex::new(Vec::new()),
            fail_availability: AtomicBool::new(false),
            availability_queries: Mutex::new(Vec::new()),
            classrooms: vec![
                json!({ "id": "R1", "name": "Room 1", "isActive": true }),
                json!({ "id": "R2", "name": "Room 2", "isActive": true }),
                json!({ "id": "R3", "name": "Old Lab", "isActive": false }),
            ],
            teachers: vec![
                json!({ "id": "t1", "name": "Ada" }),
                json!({ "id": "t2", "name": "Bo" }),
                json!({ "id": "t3", "name": "Cy" }),
                json!({ "id": "t4", "name": "Di" }),
                json!({ "id": 5, "name": "Ed" }),
            ],
            timetables: vec![
                json!({
                    "id": "tt-other",
                    "schoolId": SCHOOL_ID,
                    "classId": "c-2",
                    "entries": [
                        { "day": "Monday", "period": "1", "startTime": "09:00", "endTime": "10:00",
                          "teacherId": "t1", "subjectId": "math", "room": "R2", "periodType": "LECTURE" }
                    ]
                }),
                json!({
                    "id": "tt-edit",
                    "schoolId": SCHOOL_ID,
                    "classId": "c-1",
                    "name": "1A",
                    "entries": [
                        { "day": "Monday", "period": "1", "startTime": "09:00", "endTime": "10:00",
                          "teacherId": "t2", "subjectId": "bio", "room": "R1", "periodType": "LECTURE" },
                        { "day": "Monday", "period": "Break", "startTime": "10:00", "endTime": "10:15",
                          "periodType": "BREAK" },
                        { "day": "Monday", "period": 2, "startTime": "10:15", "endTime": "11:00",
                          "teacherId": "t3", "subjectId": "art", "periodType": "LECTURE" }
                    ]
                }),
            ],
            saved: Mutex::new(Vec::new()),
            reject_save: Mutex::new(None),
        })
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submits.lock().unwrap().clone()
    }

    fn record_token(&self, headers: &HeaderMap) {
        if let Some(value) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            self.tokens.lock().unwrap().push(value.to_string());
        }
    }
}

fn quiz_snapshot(quiz_id: &str) -> Value {
    json!({
        "id": quiz_id,
        "title": "Fractions",
        "subject": "Mathematics",
        "questions": [
            { "id": "q1", "text": "1/2 + 1/4 = ?", "type": "single-choice",
              "options": ["1/6", "2/6", "3/8", "3/4"] },
            { "id": "q2", "text": "Which equal 1/2?", "type": "multi-choice",
              "options": ["2/4", "3/5", "4/8"] },
            { "id": "q3", "text": "Largest?", "type": "single-choice",
              "options": ["1/3", "1/2"], "imageUrl": "https://cdn.test/q3.png" }
        ]
    })
}

async fn list_quizzes(State(mock): State<Arc<MockSchool>>, headers: HeaderMap) -> Json<Value> {
    mock.record_token(&headers);
    let used = mock.submits.lock().unwrap().len();
    Json(json!([
        { "id": "qz-1", "title": "Fractions", "attemptsUsed": used, "maxAttempts": 3 }
    ]))
}

async fn start_quiz(
    State(mock): State<Arc<MockSchool>>,
    headers: HeaderMap,
    Path((_student, quiz_id)): Path<(String, String)>,
) -> Json<Value> {
    mock.record_token(&headers);
    let n = mock.starts.fetch_add(1, Ordering::SeqCst) + 1;
    let ttl = mock.quiz_ttl_ms.load(Ordering::SeqCst);
    let expires_at = chrono::Utc::now() + chrono::Duration::milliseconds(ttl);
    Json(json!({
        "submissionId": format!("sub-{}", n),
        "attemptNo": n,
        "expiresAt": expires_at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        "quiz": quiz_snapshot(&quiz_id)
    }))
}

async fn submit_quiz(
    State(mock): State<Arc<MockSchool>>,
    headers: HeaderMap,
    Path((_student, quiz_id, submission_id)): Path<(String, String, String)>,
    Json(body): Json<Value>,
) -> Response {
    mock.record_token(&headers);
    let failing = mock
        .fail_next_submits
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if failing {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "message": "Grading service unavailable" })),
        )
            .into_response();
    }

    let answered = body["answers"]
        .as_array()
        .map(|a| a.iter().filter(|e| e["selected"] != json!([])).count())
        .unwrap_or(0);
    mock.submits
        .lock()
        .unwrap()
        .push((quiz_id, submission_id, body));
    Json(json!({ "score": answered as f64, "totalPoints": 3.0, "passed": answered >= 2 }))
        .into_response()
}

async fn quiz_results(State(mock): State<Arc<MockSchool>>, headers: HeaderMap) -> Json<Value> {
    mock.record_token(&headers);
    Json(json!([
        { "attemptNo": 1, "score": 2, "totalPoints": 3, "passed": true,
          "submittedAt": "2026-10-01T08:30:00Z" }
    ]))
}

async fn availability(
    State(mock): State<Arc<MockSchool>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    mock.availability_queries.lock().unwrap().push(query);
    if mock.fail_availability.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "Availability index rebuilding" })),
        )
            .into_response();
    }
    Json(Value::Array(mock.available_rooms.lock().unwrap().clone())).into_response()
}

async fn classrooms(State(mock): State<Arc<MockSchool>>) -> Json<Value> {
    Json(Value::Array(mock.classrooms.clone()))
}

async fn teachers(State(mock): State<Arc<MockSchool>>) -> Json<Value> {
    Json(Value::Array(mock.teachers.clone()))
}

async fn timetables(State(mock): State<Arc<MockSchool>>) -> Json<Value> {
    Json(Value::Array(mock.timetables.clone()))
}

fn save(mock: &MockSchool, id: Option<String>, body: Value) -> Response {
    if let Some(message) = mock.reject_save.lock().unwrap().clone() {
        return (StatusCode::CONFLICT, Json(json!({ "message": message }))).into_response();
    }
    let mut saved = body.clone();
    saved["id"] = json!(id.clone().unwrap_or_else(|| "tt-new".to_string()));
    mock.saved.lock().unwrap().push((id, body));
    Json(saved).into_response()
}

async fn create_timetable(State(mock): State<Arc<MockSchool>>, Json(body): Json<Value>) -> Response {
    save(&mock, None, body)
}

async fn update_timetable(
    State(mock): State<Arc<MockSchool>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    save(&mock, Some(id), body)
}

/// Serves `mock` on a random port and returns its base URL.
pub async fn spawn_school(mock: Arc<MockSchool>) -> String {
    let app = Router::new()
        .route("/students/{student}/quizzes", get(list_quizzes))
        .route("/students/{student}/quizzes/{quiz}/start", post(start_quiz))
        .route(
            "/students/{student}/quizzes/{quiz}/submit/{submission}",
            post(submit_quiz),
        )
        .route("/students/{student}/quizzes/{quiz}/results", get(quiz_results))
        .route("/classrooms", get(classrooms))
        .route("/classrooms/availability", get(availability))
        .route("/teachers", get(teachers))
        .route("/timetables", get(timetables).post(create_timetable))
        .route("/timetables/{id}", put(update_timetable))
        .with_state(mock);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}

pub fn test_config(school_url: &str) -> Config {
    Config {
        school_api_url: school_url.to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        rust_log: "error".to_string(),
        port: 0,
        upstream_timeout_secs: 5,
        quiz_tick_millis: 100,
        draft_idle_ttl_secs: 600,
        cors_origins: vec!["http://localhost:3000".to_string()],
    }
}

/// Spawns the portal against `school_url`; returns the portal's base URL.
pub async fn spawn_app(school_url: &str) -> String {
    spawn_app_with(test_config(school_url)).await
}

pub async fn spawn_app_with(config: Config) -> String {
    let api = HttpSchoolApi::new(&config.school_api_url, config.upstream_timeout())
        .expect("Failed to build school API client");
    let state = AppState::new(config, Arc::new(api));
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}

/// Mock school API plus a portal wired to it.
pub async fn spawn_pair() -> (Arc<MockSchool>, String) {
    let mock = MockSchool::new();
    let school_url = spawn_school(mock.clone()).await;
    let address = spawn_app(&school_url).await;
    (mock, address)
}

pub fn token(role: Role, user_id: &str) -> String {
    sign_jwt(user_id, role, Some(SCHOOL_ID), TEST_SECRET, 600).expect("Failed to sign token")
}
