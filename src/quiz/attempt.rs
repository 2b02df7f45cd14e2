// src/quiz/attempt.rs

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::{
    error::AppError,
    models::{
        attempt::{AnswerEntry, AttemptGrant},
        question::Quiz,
    },
};

/// What one countdown tick observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Time is left; whole seconds remaining.
    Running(u64),
    /// The clock ran out after having shown time left.
    AutoSubmit,
    /// The clock was already out on the first tick.
    Expired,
}

/// Whole seconds between `now_ms` and `expires_at_ms`, floored at zero.
pub fn remaining_seconds(expires_at_ms: i64, now_ms: i64) -> u64 {
    let left = expires_at_ms.saturating_sub(now_ms);
    if left <= 0 { 0 } else { (left / 1000) as u64 }
}

/// One student's attempt at a quiz while it is being taken.
#[derive(Debug, Clone)]
pub struct QuizAttempt {
    quiz_id: String,
    submission_id: String,
    attempt_no: u32,
    expires_at_ms: i64,
    quiz: Quiz,
    answers: HashMap<String, BTreeSet<usize>>,
    had_positive_time: bool,
}

impl QuizAttempt {
    pub fn new(grant: AttemptGrant) -> Self {
        let answers = grant
            .quiz
            .questions
            .iter()
            .map(|q| (q.id.clone(), BTreeSet::new()))
            .collect();

        Self {
            quiz_id: grant.quiz_id,
            submission_id: grant.submission_id,
            attempt_no: grant.attempt_no,
            expires_at_ms: grant.expires_at_ms,
            quiz: grant.quiz,
            answers,
            had_positive_time: false,
        }
    }

    pub fn quiz_id(&self) -> &str {
        &self.quiz_id
    }

    pub fn submission_id(&self) -> &str {
        &self.submission_id
    }

    pub fn expires_at_ms(&self) -> i64 {
        self.expires_at_ms
    }

    /// Advances the countdown to `now_ms`.
    ///
    /// A tick with time left arms auto-submit; once armed, reaching zero
    /// asks for submission. Reaching zero unarmed means the attempt was
    /// dead on arrival.
    pub fn tick(&mut self, now_ms: i64) -> Tick {
        match remaining_seconds(self.expires_at_ms, now_ms) {
            0 if self.had_positive_time => Tick::AutoSubmit,
            0 => Tick::Expired,
            left => {
                self.had_positive_time = true;
                Tick::Running(left)
            }
        }
    }

    /// Toggles `option_index` of `question_id`.
    ///
    /// Single-choice questions keep exactly the last pick; multi-choice
    /// questions flip membership of the index.
    pub fn toggle_select(&mut self, question_id: &str, option_index: usize) -> Result<Vec<usize>, AppError> {
        let question = self
            .quiz
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown question '{}'", question_id)))?;

        if option_index >= question.options.len() {
            return Err(AppError::BadRequest(format!(
                "Question '{}' has no option {}",
                question_id, option_index
            )));
        }

        let multi = question.is_multi_choice();
        let selected = self.answers.entry(question_id.to_string()).or_default();
        if multi {
            if !selected.remove(&option_index) {
                selected.insert(option_index);
            }
        } else {
            selected.clear();
            selected.insert(option_index);
        }
        Ok(selected.iter().copied().collect())
    }

    /// One entry per question in quiz order; unanswered questions get `[]`.
    pub fn answer_sheet(&self) -> Vec<AnswerEntry> {
        self.quiz
            .questions
            .iter()
            .map(|q| AnswerEntry {
                question_id: q.id.clone(),
                selected: self
                    .answers
                    .get(&q.id)
                    .map(|s| s.iter().copied().collect())
                    .unwrap_or_default(),
            })
            .collect()
    }

    pub fn view(&self, now_ms: i64) -> AttemptView {
        AttemptView {
            quiz_id: self.quiz_id.clone(),
            submission_id: self.submission_id.clone(),
            attempt_no: self.attempt_no,
            expires_at_epoch_ms: self.expires_at_ms,
            remaining_seconds: remaining_seconds(self.expires_at_ms, now_ms),
            quiz: self.quiz.clone(),
            answers: self.answer_sheet(),
        }
    }
}

/// Attempt as shown to the student.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptView {
    pub quiz_id: String,
    pub submission_id: String,
    pub attempt_no: u32,
    pub expires_at_epoch_ms: i64,
    pub remaining_seconds: u64,
    pub quiz: Quiz,
    pub answers: Vec<AnswerEntry>,
}
