#![forbid(unsafe_code)]

//! Lesson library administration service.
//!
//! Users, invitations, submission review, analytics, and the duplicate
//! lesson review workflow, exposed as a JSON HTTP API.

pub mod admin;
pub mod config;
pub mod errors;
pub mod http;
pub mod models;
pub mod persistence;
pub mod platform;
pub mod report;
pub mod review;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
