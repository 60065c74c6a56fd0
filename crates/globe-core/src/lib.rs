//! # Globe Core
//!
//! The domain layer of The Globe API.
//! Blog entities, the ports infrastructure must implement, and the chat-agent
//! bridge. Nothing in here talks to a network or a database directly.

pub mod chat;
pub mod domain;
pub mod error;
pub mod ports;

pub use error::{DomainError, RepoError};
