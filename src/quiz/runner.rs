// src/quiz/runner.rs

use std::{
    collections::HashMap,
    mem,
    sync::{Arc, Weak},
    time::Duration,
};

use chrono::Utc;
use serde::Serialize;
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

use crate::{
    client::SchoolApi,
    error::AppError,
    models::{
        attempt::{AnswerEntry, SubmitResult},
        question::QuizSummary,
    },
    quiz::attempt::{AttemptView, QuizAttempt, Tick},
    utils::jwt::Session,
};

const EXPIRED_MESSAGE: &str = "Quiz attempt has expired";

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptState {
    Idle,
    Started,
    Submitting,
}

/// An attempt together with the session that started it; the timer
/// submits on behalf of that session.
struct Active {
    session: Session,
    attempt: QuizAttempt,
}

#[derive(Default)]
enum Phase {
    #[default]
    Idle,
    Started(Box<Active>),
    Submitting(Box<Active>),
}

#[derive(Default)]
struct StudentSlot {
    phase: Phase,
    timer: Option<JoinHandle<()>>,
    last_result: Option<SubmitResult>,
    last_error: Option<String>,
}

impl StudentSlot {
    fn is_busy(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

/// Everything a submission needs once the slot lock is released.
struct PendingSubmit {
    session: Session,
    quiz_id: String,
    submission_id: String,
    answers: Vec<AnswerEntry>,
}

impl From<&Active> for PendingSubmit {
    fn from(active: &Active) -> Self {
        Self {
            session: active.session.clone(),
            quiz_id: active.attempt.quiz_id().to_string(),
            submission_id: active.attempt.submission_id().to_string(),
            answers: active.attempt.answer_sheet(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Manual,
    Timer,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizStatus {
    pub state: AttemptState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt: Option<AttemptView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_result: Option<SubmitResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    pub result: SubmitResult,
    /// Refreshed quiz list; absent when the refresh itself failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quizzes: Option<Vec<QuizSummary>>,
}

/// Per-student quiz attempt state machine: `Idle -> Started -> Submitting -> Idle`.
///
/// Each started attempt owns a countdown task that ticks every `tick`
/// and submits automatically when the clock runs out.
pub struct QuizRunner {
    api: Arc<dyn SchoolApi>,
    tick: Duration,
    slots: Mutex<HashMap<String, StudentSlot>>,
}

impl QuizRunner {
    pub fn new(api: Arc<dyn SchoolApi>, tick: Duration) -> Self {
        Self {
            api,
            tick,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Starts an attempt at `quiz_id` for the session's student.
    ///
    /// The first countdown tick runs here: an attempt that arrives with
    /// no time left is discarded with `AppError::Expired`.
    pub async fn start(self: &Arc<Self>, session: &Session, quiz_id: &str) -> Result<AttemptView, AppError> {
        let student = session.user_id.clone();
        if self.slots.lock().await.get(&student).is_some_and(StudentSlot::is_busy) {
            return Err(AppError::Conflict("A quiz attempt is already in progress".to_string()));
        }

        let grant = match self
            .api
            .start_quiz(session, quiz_id)
            .await
            .and_then(|response| response.into_grant(quiz_id))
        {
            Ok(grant) => grant,
            Err(e) => {
                tracing::warn!("Failed to start quiz {} for {}: {}", quiz_id, student, e);
                self.slots.lock().await.entry(student).or_default().last_error = Some(e.to_string());
                return Err(e);
            }
        };

        let mut attempt = QuizAttempt::new(grant);
        let now = now_ms();

        let mut slots = self.slots.lock().await;
        let slot = slots.entry(student.clone()).or_default();
        if slot.is_busy() {
            return Err(AppError::Conflict("A quiz attempt is already in progress".to_string()));
        }

        if let Tick::Expired = attempt.tick(now) {
            tracing::warn!(
                "Discarding attempt {} of quiz {} for {}: already expired",
                attempt.submission_id(),
                quiz_id,
                student
            );
            slot.last_error = Some(EXPIRED_MESSAGE.to_string());
            return Err(AppError::Expired(EXPIRED_MESSAGE.to_string()));
        }

        let view = attempt.view(now);
        slot.phase = Phase::Started(Box::new(Active {
            session: session.clone(),
            attempt,
        }));
        slot.last_result = None;
        slot.last_error = None;
        slot.timer = Some(self.spawn_timer(student.clone()));

        tracing::info!(
            "Student {} started quiz {} (submission {}, {}s left)",
            student,
            quiz_id,
            view.submission_id,
            view.remaining_seconds
        );
        Ok(view)
    }

    /// Current state of the student's attempt.
    ///
    /// An idle slot is dropped once its last result or error has been
    /// reported here.
    pub async fn status(&self, student_id: &str) -> QuizStatus {
        let mut slots = self.slots.lock().await;
        let Some(slot) = slots.get(student_id) else {
            return QuizStatus {
                state: AttemptState::Idle,
                attempt: None,
                last_result: None,
                last_error: None,
            };
        };

        let now = now_ms();
        let (state, attempt) = match &slot.phase {
            Phase::Idle => (AttemptState::Idle, None),
            Phase::Started(active) => (AttemptState::Started, Some(active.attempt.view(now))),
            Phase::Submitting(active) => (AttemptState::Submitting, Some(active.attempt.view(now))),
        };
        let status = QuizStatus {
            state,
            attempt,
            last_result: slot.last_result.clone(),
            last_error: slot.last_error.clone(),
        };
        if state == AttemptState::Idle {
            slots.remove(student_id);
        }
        status
    }

    /// Toggles one option of the running attempt.
    pub async fn select(
        &self,
        student_id: &str,
        question_id: &str,
        option_index: usize,
    ) -> Result<AttemptView, AppError> {
        let mut slots = self.slots.lock().await;
        let slot = slots
            .get_mut(student_id)
            .ok_or_else(|| AppError::NotFound("No quiz attempt in progress".to_string()))?;

        match &mut slot.phase {
            Phase::Started(active) => {
                active.attempt.toggle_select(question_id, option_index)?;
                Ok(active.attempt.view(now_ms()))
            }
            Phase::Submitting(_) => Err(AppError::Conflict(
                "The attempt is being submitted".to_string(),
            )),
            Phase::Idle => Err(AppError::NotFound("No quiz attempt in progress".to_string())),
        }
    }

    /// Submits the running attempt now.
    ///
    /// On failure the attempt stays started and the countdown resumes so
    /// the student can retry before expiry.
    pub async fn submit(self: &Arc<Self>, student_id: &str) -> Result<SubmitOutcome, AppError> {
        let pending = {
            let mut slots = self.slots.lock().await;
            let slot = slots
                .get_mut(student_id)
                .ok_or_else(|| AppError::NotFound("No quiz attempt in progress".to_string()))?;

            match mem::take(&mut slot.phase) {
                Phase::Started(active) => {
                    slot.stop_timer();
                    let pending = PendingSubmit::from(active.as_ref());
                    slot.phase = Phase::Submitting(active);
                    pending
                }
                Phase::Submitting(active) => {
                    slot.phase = Phase::Submitting(active);
                    return Err(AppError::Conflict(
                        "The attempt is already being submitted".to_string(),
                    ));
                }
                Phase::Idle => {
                    return Err(AppError::NotFound("No quiz attempt in progress".to_string()));
                }
            }
        };

        self.finish(student_id, pending, Trigger::Manual).await
    }

    /// Drops the running attempt without telling the school API.
    pub async fn cancel(&self, student_id: &str) -> Result<(), AppError> {
        let mut slots = self.slots.lock().await;
        let slot = slots
            .get_mut(student_id)
            .ok_or_else(|| AppError::NotFound("No quiz attempt in progress".to_string()))?;

        match mem::take(&mut slot.phase) {
            Phase::Started(active) => {
                slot.stop_timer();
                slots.remove(student_id);
                tracing::info!(
                    "Student {} cancelled attempt {}",
                    student_id,
                    active.attempt.submission_id()
                );
                Ok(())
            }
            Phase::Submitting(active) => {
                slot.phase = Phase::Submitting(active);
                Err(AppError::Conflict("The attempt is being submitted".to_string()))
            }
            Phase::Idle => Err(AppError::NotFound("No quiz attempt in progress".to_string())),
        }
    }

    async fn finish(
        self: &Arc<Self>,
        student_id: &str,
        pending: PendingSubmit,
        trigger: Trigger,
    ) -> Result<SubmitOutcome, AppError> {
        let submitted = self
            .api
            .submit_quiz(
                &pending.session,
                &pending.quiz_id,
                &pending.submission_id,
                pending.answers,
            )
            .await;

        match submitted {
            Ok(result) => {
                {
                    let mut slots = self.slots.lock().await;
                    let slot = slots.entry(student_id.to_string()).or_default();
                    slot.phase = Phase::Idle;
                    slot.last_result = Some(result.clone());
                    slot.last_error = None;
                }
                tracing::info!(
                    "Student {} submitted quiz {} ({:?}): {}/{}",
                    student_id,
                    pending.quiz_id,
                    trigger,
                    result.score,
                    result.total_points
                );

                let quizzes = match self.api.list_quizzes(&pending.session).await {
                    Ok(quizzes) => Some(quizzes),
                    Err(e) => {
                        tracing::warn!("Failed to refresh quiz list for {}: {}", student_id, e);
                        None
                    }
                };
                Ok(SubmitOutcome { result, quizzes })
            }
            Err(e) => {
                tracing::warn!(
                    "Submission {} of quiz {} failed ({:?}): {}",
                    pending.submission_id,
                    pending.quiz_id,
                    trigger,
                    e
                );
                let mut slots = self.slots.lock().await;
                let slot = slots.entry(student_id.to_string()).or_default();
                if let Phase::Submitting(active) = mem::take(&mut slot.phase) {
                    slot.phase = Phase::Started(active);
                    if trigger == Trigger::Manual {
                        slot.timer = Some(self.spawn_timer(student_id.to_string()));
                    }
                }
                slot.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn spawn_timer(self: &Arc<Self>, student_id: String) -> JoinHandle<()> {
        let runner: Weak<Self> = Arc::downgrade(self);
        let period = self.tick;

        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick completes immediately; start already ticked
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(runner) = runner.upgrade() else {
                    break;
                };
                if !runner.on_tick(&student_id).await {
                    break;
                }
            }
        })
    }

    /// One countdown step. Returns whether the timer should keep going.
    async fn on_tick(self: &Arc<Self>, student_id: &str) -> bool {
        let pending = {
            let mut slots = self.slots.lock().await;
            let Some(slot) = slots.get_mut(student_id) else {
                return false;
            };
            let Phase::Started(active) = &mut slot.phase else {
                return false;
            };

            match active.attempt.tick(now_ms()) {
                Tick::Running(_) => return true,
                Tick::Expired => {
                    tracing::warn!("Attempt of {} expired before any time was shown", student_id);
                    slot.phase = Phase::Idle;
                    slot.timer = None;
                    slot.last_error = Some(EXPIRED_MESSAGE.to_string());
                    return false;
                }
                Tick::AutoSubmit => {
                    // this task is the timer; detach rather than abort it
                    slot.timer = None;
                    let Phase::Started(active) = mem::take(&mut slot.phase) else {
                        return false;
                    };
                    let pending = PendingSubmit::from(active.as_ref());
                    slot.phase = Phase::Submitting(active);
                    pending
                }
            }
        };

        tracing::info!("Time is up for {}, submitting automatically", student_id);
        // failures are recorded on the slot by `finish`
        let _ = self.finish(student_id, pending, Trigger::Timer).await;
        false
    }
}
