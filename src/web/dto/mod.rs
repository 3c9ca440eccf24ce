pub mod admin;
pub mod exams;
pub mod levels;
pub mod progress;
