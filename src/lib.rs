//! Threads - persistence for conversational and agentic data.
//!
//! An append-only log of items grouped into threads, with dependency edges
//! between items and resumable stream state.
//!
//! # Architecture
//!
//! - [`storage`] - Schema, migrations, and the [`storage::Backend`] capability
//! - [`model`] - Record types and their insert/update payloads
//! - [`store`] - Typed models over a backend ([`ThreadModels`])
//! - [`validate`] - Payload validation and lenient enum parsing
//! - [`config`] - Database path and environment settings
//! - [`cli`] - The `threads` command-line interface
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod storage;
pub mod store;
pub mod validate;

pub use error::{Error, Result};
pub use storage::{Backend, Condition, Filter, SqliteBackend};
pub use store::ThreadModels;
