// src/config.rs

use std::env;
use std::time::Duration;

use dotenvy::dotenv;

/// Period of the quiz countdown when `QUIZ_TICK_MILLIS` is not set.
pub const DEFAULT_QUIZ_TICK_MILLIS: u64 = 1000;

/// Drafts untouched for this long are dropped.
pub const DEFAULT_DRAFT_IDLE_TTL_SECS: u64 = 4 * 60 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the school REST API, e.g. `https://school.example.com/api`.
    pub school_api_url: String,
    pub jwt_secret: String,
    pub rust_log: String,
    pub port: u16,
    pub upstream_timeout_secs: u64,
    pub quiz_tick_millis: u64,
    pub draft_idle_ttl_secs: u64,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let school_api_url = env::var("SCHOOL_API_URL")
            .expect("SCHOOL_API_URL must be set");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        let upstream_timeout_secs = env::var("UPSTREAM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        let quiz_tick_millis = env::var("QUIZ_TICK_MILLIS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_QUIZ_TICK_MILLIS);

        let draft_idle_ttl_secs = env::var("DRAFT_IDLE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_DRAFT_IDLE_TTL_SECS);

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://127.0.0.1:3000".to_string(),
                ]
            });

        Self {
            school_api_url,
            jwt_secret,
            rust_log,
            port,
            upstream_timeout_secs,
            quiz_tick_millis,
            draft_idle_ttl_secs,
            cors_origins,
        }
    }

    pub fn quiz_tick(&self) -> Duration {
        Duration::from_millis(self.quiz_tick_millis)
    }

    pub fn draft_idle_ttl(&self) -> Duration {
        Duration::from_secs(self.draft_idle_ttl_secs)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}
