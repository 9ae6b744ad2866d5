//! taskmesh core: a dependency-driven task loop for a single objective run.
//!
//! The crate owns the task data model, readiness computation, bounded round
//! dispatch, the tool dispatcher and the user-input suspension table. Network
//! collaborators (LLM, search, GitHub) live behind the traits in [`context`].

pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
