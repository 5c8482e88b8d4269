pub mod diary;
pub mod mental;
pub mod user;
