pub mod backend;
pub mod config;
pub mod coordinator;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod scheduler;
pub mod status;
pub mod trace;
pub mod validate;

#[cfg(test)]
pub mod testing;
