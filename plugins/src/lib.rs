pub mod executor;
pub mod factory;
pub mod github;
pub mod http;
pub mod llm;
pub mod planner;
pub mod search;
pub mod services;
