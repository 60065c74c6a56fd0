//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod agent;
mod repository;
mod secrets;
mod storage;

pub use agent::{
    AgentDefinition, AgentError, AgentInfo, AgentMessage, AgentRun, AgentService, RunError,
    RunStatus,
};
pub use repository::{BaseRepository, CategoryRepository, CommentRepository, PostRepository};
pub use secrets::{SecretError, SecretStore};
pub use storage::{InitState, StorageHealth, StorageProbe};
