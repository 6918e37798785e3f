//! Narrated reel pipeline worker.
//!
//! This crate provides:
//! - The [`Orchestrator`] running scene, merge, concatenation and load-test units
//! - Working directory management and asset resolution
//! - Batch publishing to object storage
//! - The shared stage timing log and its aggregate views
//! - Completion callbacks for background units

pub mod callback;
pub mod command;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod publisher;
pub mod resolver;
pub mod timing;
pub mod workspace;

#[cfg(test)]
mod testing;

pub use command::WorkerCommand;
pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::UnitLogger;
pub use pipeline::Orchestrator;
pub use timing::TimingLog;
