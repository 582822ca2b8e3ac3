//! tasknest — personal task-tracking backend core.
//!
//! Authenticated users create, list, complete, and delete tasks with due
//! dates, plus bulk variants of each. Recurring-task definitions
//! ("routines") are expanded into concrete task records by the
//! materialization engine in [`engine`], which the today/upcoming views
//! run before querying. HTTP routing, authentication, and JSON framing
//! live in the surrounding web layer; this crate exposes typed operations,
//! serde-serializable responses, and an error whose code maps to an HTTP
//! status.

pub mod api;
pub mod dates;
pub mod db;
pub mod engine;
pub mod error;
pub mod models;

pub use error::{ErrorCode, TasknestError};
