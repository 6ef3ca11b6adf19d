//! Slack host for ragbot.
//!
//! Receives Events API callbacks over HTTP, answers `@mentions` through the
//! shared `TurnOrchestrator`, and replies in the originating thread. Each
//! Slack thread is one conversation.

pub mod bridge;
pub mod client;
pub mod error;
pub mod events;
pub mod server;
pub mod signature;

pub use bridge::SlackBridge;
pub use client::{MessageSink, SlackWebClient};
pub use error::{SlackError, SlackResult};
pub use server::{router, serve, AppState};

#[cfg(test)]
mod tests;
