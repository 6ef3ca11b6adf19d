//! Vertex AI Gemini client.
//!
//! Implements `AnswerCapability` for Gemini publisher models, with
//! retrieval grounding against a Vertex AI RAG corpus.

mod api;
mod catalog;
mod client;
mod config;

pub use catalog::{partition_models, short_model_name, CorpusInfo, ModelInfo};
pub use client::GeminiClient;
pub use config::GeminiConfig;
