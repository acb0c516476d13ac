//! # DreamPip API Server Library
//!
//! HTTP surface over the budget ledger: budget reads and checks, task-list
//! CRUD that keeps budget totals consistent, and user settings.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
