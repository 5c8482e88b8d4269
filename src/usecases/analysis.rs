use std::sync::Arc;

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::repositories::DiaryRepository;
use crate::services::analysis::{build_messages, MoodAnalyzer};

pub const NO_DIARIES_TO_ANALYZE: &str = "分析対象の日記がありません";

#[derive(Clone)]
pub struct AnalysisUsecase {
    diaries: Arc<dyn DiaryRepository>,
    analyzer: Arc<dyn MoodAnalyzer>,
}

impl AnalysisUsecase {
    pub fn new(diaries: Arc<dyn DiaryRepository>, analyzer: Arc<dyn MoodAnalyzer>) -> Self {
        Self { diaries, analyzer }
    }

    pub async fn analyze_user_diaries(&self, user_id: Uuid) -> AppResult<String> {
        let diaries = self.diaries.find_by_user(user_id).await?;
        if diaries.is_empty() {
            return Err(AppError::NotFound(NO_DIARIES_TO_ANALYZE.into()));
        }

        tracing::info!(user_id = %user_id, entries = diaries.len(), "Requesting mood analysis");
        let result = self.analyzer.analyze(build_messages(&diaries)).await?;
        Ok(result)
    }
}
