//! rollcall — headless client for a student attendance service.
//!
//! Covers login/logout, schedule and event browsing, attendance history,
//! and the QR-scan check-in pipeline: debounced scan intake, payload
//! validation, authenticated-vs-pending dispatch, and replay of deferred
//! scans after login.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod model;
pub mod scan;
pub mod store;

pub use error::{Result, RollcallError};
