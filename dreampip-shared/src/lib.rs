//! # DreamPip Shared Library
//!
//! This crate contains the data model, storage layer and budget accounting
//! used by the DreamPip API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `db`: Connection pooling and migrations
//! - `budget`: Budget ledger, storage trait and task-list service
//! - `settings`: Typed per-user settings
//! - `auth`: Bearer token verification

pub mod auth;
pub mod budget;
pub mod db;
pub mod models;
pub mod settings;

/// Current version of the DreamPip shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
