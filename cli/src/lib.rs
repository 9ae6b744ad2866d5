//! taskmesh-cli library: exposes the assembly and flow modules for tests.

pub mod app;
pub mod commands;
pub mod flow;
