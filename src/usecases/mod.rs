//! Orchestration between handlers and repositories.

pub mod analysis;
pub mod diary;
pub mod import;
pub mod user;

pub use analysis::AnalysisUsecase;
pub use diary::DiaryUsecase;
pub use user::UserUsecase;
