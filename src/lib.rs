pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod services;
pub mod usecases;

use std::sync::Arc;

use auth::rate_limit::RateLimitState;
use config::Config;
use db::Database;
use services::analysis::MoodAnalyzer;
use usecases::{AnalysisUsecase, DiaryUsecase, UserUsecase};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub diaries: DiaryUsecase,
    pub users: UserUsecase,
    pub analysis: AnalysisUsecase,
    pub rate_limiter: RateLimitState,
}

impl AppState {
    pub fn new(db: Database, config: Arc<Config>, analyzer: Arc<dyn MoodAnalyzer>) -> Self {
        let diary_repo = db.diary_repository();

        Self {
            diaries: DiaryUsecase::new(diary_repo.clone()),
            users: UserUsecase::new(db.user_repository(), config.clone()),
            analysis: AnalysisUsecase::new(diary_repo, analyzer),
            rate_limiter: RateLimitState::new(config.auth_rate_limit),
            db,
            config,
        }
    }
}
