//! Remote storage abstraction for updrift.
//!
//! This module provides a trait-based interface for the remote side of the
//! upload pipeline and a Google Drive backend implementing it.
//!
//! # Design Principles
//! - Provider isolation: no provider-specific logic leaks into the sync crate
//! - Async operations: all I/O operations are async
//! - Streaming support: file content is handled via streams
//! - Unified error semantics: consistent error types across providers

pub mod gdrive;
pub mod memory;
pub mod remote;

pub use memory::MemoryRemote;
pub use remote::{ByteStream, RemoteFile, RemoteStore, UploadRequest};
