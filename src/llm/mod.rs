pub mod client;

pub use client::{JsonCompletion, LlmClient, Message};
