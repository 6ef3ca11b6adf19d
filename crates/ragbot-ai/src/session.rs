//! Conversation session management.
//!
//! The `SessionStore` owns every conversation's turn history. The
//! `TurnOrchestrator` drives one request/response cycle against an
//! `AnswerCapability`, committing the turns on success and rolling the
//! pending user turn back on failure, timeout, or cancellation.

mod orchestrator;
mod store;
mod types;


pub use orchestrator::TurnOrchestrator;
pub use store::SessionStore;
pub use types::{Reply, TurnError};
