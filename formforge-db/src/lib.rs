//! Formforge Database Library
//!
//! Provisioning and health checks for form tables. The CLI tool (main.rs)
//! uses this library.

pub mod commands;
pub mod error;
pub mod forms;

pub use error::DbToolError;
