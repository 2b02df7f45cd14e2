// tests/quiz_tests.rs

mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{spawn_pair, token};
use portal::models::user::Role;
use serde_json::{Value, json};

async fn start(client: &reqwest::Client, address: &str, bearer: &str) -> reqwest::Response {
    client
        .post(format!("{}/api/quizzes/qz-1/start", address))
        .bearer_auth(bearer)
        .send()
        .await
        .expect("Failed to execute request")
}

async fn select(client: &reqwest::Client, address: &str, bearer: &str, question: &str, option: usize) -> Value {
    let response = client
        .put(format!("{}/api/quizzes/attempt/answers", address))
        .bearer_auth(bearer)
        .json(&json!({ "questionId": question, "optionIndex": option }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    response.json().await.unwrap()
}

async fn attempt_status(client: &reqwest::Client, address: &str, bearer: &str) -> Value {
    client
        .get(format!("{}/api/quizzes/attempt", address))
        .bearer_auth(bearer)
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn submit_sends_every_question_in_order() {
    // Arrange
    let (mock, address) = spawn_pair().await;
    let client = reqwest::Client::new();
    let bearer = token(Role::Student, "stu-1");

    // Act
    let started = start(&client, &address, &bearer).await;
    assert_eq!(started.status().as_u16(), 201);
    let attempt: Value = started.json().await.unwrap();
    assert_eq!(attempt["submissionId"], "sub-1");
    assert!(attempt["remainingSeconds"].as_u64().unwrap() > 500);
    assert_eq!(attempt["quiz"]["questions"].as_array().unwrap().len(), 3);

    select(&client, &address, &bearer, "q1", 1).await;
    select(&client, &address, &bearer, "q1", 3).await;
    select(&client, &address, &bearer, "q2", 2).await;
    select(&client, &address, &bearer, "q2", 1).await;
    let view = select(&client, &address, &bearer, "q2", 0).await;
    assert_eq!(view["answers"][1]["selected"], json!([0, 1, 2]));
    select(&client, &address, &bearer, "q2", 1).await;

    let response = client
        .post(format!("{}/api/quizzes/attempt/submit", address))
        .bearer_auth(&bearer)
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    let outcome: Value = response.json().await.unwrap();
    assert_eq!(outcome["result"]["totalPoints"], 3.0);
    assert_eq!(outcome["quizzes"][0]["attemptsUsed"], 1);

    let submissions = mock.submissions();
    assert_eq!(submissions.len(), 1);
    let (quiz_id, submission_id, body) = &submissions[0];
    assert_eq!(quiz_id, "qz-1");
    assert_eq!(submission_id, "sub-1");
    assert_eq!(
        body["answers"],
        json!([
            { "questionId": "q1", "selected": [3] },
            { "questionId": "q2", "selected": [0, 2] },
            { "questionId": "q3", "selected": [] }
        ])
    );

    let status = attempt_status(&client, &address, &bearer).await;
    assert_eq!(status["state"], "idle");
    assert_eq!(status["lastResult"]["totalPoints"], 3.0);

    // the result is reported once
    let later = attempt_status(&client, &address, &bearer).await;
    assert_eq!(later["state"], "idle");
    assert!(later.get("lastResult").is_none());
}

#[tokio::test]
async fn expired_attempt_is_refused_and_never_submitted() {
    // Arrange
    let (mock, address) = spawn_pair().await;
    mock.quiz_ttl_ms.store(-5_000, Ordering::SeqCst);
    let client = reqwest::Client::new();
    let bearer = token(Role::Student, "stu-1");

    // Act
    let response = start(&client, &address, &bearer).await;

    // Assert
    assert_eq!(response.status().as_u16(), 410);
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(mock.submissions().is_empty());

    let status = attempt_status(&client, &address, &bearer).await;
    assert_eq!(status["state"], "idle");
    assert!(status["lastError"].as_str().unwrap().contains("expired"));
}

#[tokio::test]
async fn countdown_auto_submits_exactly_once() {
    // Arrange
    let (mock, address) = spawn_pair().await;
    mock.quiz_ttl_ms.store(1_800, Ordering::SeqCst);
    let client = reqwest::Client::new();
    let bearer = token(Role::Student, "stu-1");

    // Act
    assert_eq!(start(&client, &address, &bearer).await.status().as_u16(), 201);
    select(&client, &address, &bearer, "q3", 1).await;
    tokio::time::sleep(Duration::from_millis(3_000)).await;

    // Assert
    let submissions = mock.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].2["answers"][2]["selected"], json!([1]));
    assert_eq!(submissions[0].2["answers"][0]["selected"], json!([]));

    let status = attempt_status(&client, &address, &bearer).await;
    assert_eq!(status["state"], "idle");
    assert!(status.get("attempt").is_none());
    assert!(status["lastResult"].is_object());
}

#[tokio::test]
async fn failed_submit_leaves_attempt_open_for_retry() {
    // Arrange
    let (mock, address) = spawn_pair().await;
    mock.fail_next_submits.store(1, Ordering::SeqCst);
    let client = reqwest::Client::new();
    let bearer = token(Role::Student, "stu-1");
    start(&client, &address, &bearer).await;
    select(&client, &address, &bearer, "q1", 0).await;

    // Act
    let first = client
        .post(format!("{}/api/quizzes/attempt/submit", address))
        .bearer_auth(&bearer)
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(first.status().as_u16(), 502);
    let body: Value = first.json().await.unwrap();
    assert_eq!(body["error"], "Grading service unavailable");

    let status = attempt_status(&client, &address, &bearer).await;
    assert_eq!(status["state"], "started");
    assert_eq!(status["attempt"]["answers"][0]["selected"], json!([0]));
    assert_eq!(status["lastError"], "Grading service unavailable");

    let retry = client
        .post(format!("{}/api/quizzes/attempt/submit", address))
        .bearer_auth(&bearer)
        .send()
        .await
        .unwrap();
    assert_eq!(retry.status().as_u16(), 200);
    assert_eq!(mock.submissions().len(), 1);
}

#[tokio::test]
async fn cancel_discards_without_calling_the_school_api() {
    // Arrange
    let (mock, address) = spawn_pair().await;
    let client = reqwest::Client::new();
    let bearer = token(Role::Student, "stu-1");
    start(&client, &address, &bearer).await;

    // A second start while one is running is refused
    assert_eq!(start(&client, &address, &bearer).await.status().as_u16(), 409);

    // Act
    let cancelled = client
        .delete(format!("{}/api/quizzes/attempt", address))
        .bearer_auth(&bearer)
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(cancelled.status().as_u16(), 204);
    assert!(mock.submissions().is_empty());
    assert_eq!(attempt_status(&client, &address, &bearer).await["state"], "idle");

    let again = client
        .delete(format!("{}/api/quizzes/attempt", address))
        .bearer_auth(&bearer)
        .send()
        .await
        .unwrap();
    assert_eq!(again.status().as_u16(), 404);
}

#[tokio::test]
async fn invalid_selection_is_rejected() {
    let (_mock, address) = spawn_pair().await;
    let client = reqwest::Client::new();
    let bearer = token(Role::Student, "stu-1");
    start(&client, &address, &bearer).await;

    let response = client
        .put(format!("{}/api/quizzes/attempt/answers", address))
        .bearer_auth(&bearer)
        .json(&json!({ "questionId": "q3", "optionIndex": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn attempts_are_per_student() {
    let (_mock, address) = spawn_pair().await;
    let client = reqwest::Client::new();
    let alice = token(Role::Student, "stu-1");
    let bob = token(Role::Student, "stu-2");

    start(&client, &address, &alice).await;

    assert_eq!(attempt_status(&client, &address, &alice).await["state"], "started");
    assert_eq!(attempt_status(&client, &address, &bob).await["state"], "idle");
    assert_eq!(start(&client, &address, &bob).await.status().as_u16(), 201);
}

#[tokio::test]
async fn list_and_results_forward_the_bearer_token() {
    let (mock, address) = spawn_pair().await;
    let client = reqwest::Client::new();
    let bearer = token(Role::Student, "stu-1");

    let list: Value = client
        .get(format!("{}/api/quizzes", address))
        .bearer_auth(&bearer)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list[0]["id"], "qz-1");
    assert_eq!(list[0]["maxAttempts"], 3);

    let results: Value = client
        .get(format!("{}/api/quizzes/qz-1/results", address))
        .bearer_auth(&bearer)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(results[0]["attemptNo"], 1);
    assert_eq!(results[0]["passed"], true);

    let tokens = mock.tokens.lock().unwrap().clone();
    assert_eq!(tokens.len(), 2);
    assert!(tokens.iter().all(|t| *t == format!("Bearer {}", bearer)));
}

#[tokio::test]
async fn quiz_routes_require_a_student() {
    let (_mock, address) = spawn_pair().await;
    let client = reqwest::Client::new();

    let anonymous = client
        .get(format!("{}/api/quizzes/attempt", address))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status().as_u16(), 401);

    let admin = client
        .get(format!("{}/api/quizzes/attempt", address))
        .bearer_auth(token(Role::Admin, "adm-1"))
        .send()
        .await
        .unwrap();
    assert_eq!(admin.status().as_u16(), 403);
}
