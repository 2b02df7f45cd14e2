// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    client::SchoolApi, config::Config, quiz::runner::QuizRunner, timetable::drafts::DraftStore,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub api: Arc<dyn SchoolApi>,
    pub quizzes: Arc<QuizRunner>,
    pub drafts: Arc<DraftStore>,
}

impl AppState {
    /// Wires the quiz runner and draft store to one shared school API client.
    pub fn new(config: Config, api: Arc<dyn SchoolApi>) -> Self {
        let quizzes = Arc::new(QuizRunner::new(api.clone(), config.quiz_tick()));
        let drafts = Arc::new(DraftStore::new(api.clone(), config.draft_idle_ttl()));
        Self {
            config,
            api,
            quizzes,
            drafts,
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<dyn SchoolApi> {
    fn from_ref(state: &AppState) -> Self {
        state.api.clone()
    }
}

impl FromRef<AppState> for Arc<QuizRunner> {
    fn from_ref(state: &AppState) -> Self {
        state.quizzes.clone()
    }
}

impl FromRef<AppState> for Arc<DraftStore> {
    fn from_ref(state: &AppState) -> Self {
        state.drafts.clone()
    }
}
