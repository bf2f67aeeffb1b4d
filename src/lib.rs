//! Generate quizzes from PDF, Word, PowerPoint and text documents.

pub mod config;
pub mod export;
pub mod extract;
pub mod llm;
pub mod observability;
pub mod quiz;
pub mod render;
pub mod server;
