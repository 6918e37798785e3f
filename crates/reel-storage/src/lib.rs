//! Cloudflare R2 publishing for reel artifacts.
//!
//! This crate provides:
//! - Streaming file upload to R2
//! - The [`ObjectStore`] trait pipelines publish through
//! - Object key layout and public URL construction

pub mod client;
pub mod error;
pub mod keys;
pub mod store;

pub use client::{R2Client, R2Config};
pub use error::{StorageError, StorageResult};
pub use store::{DisabledStore, ObjectStore};
