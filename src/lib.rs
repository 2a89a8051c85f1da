//! KBMK backend - organizational management API
//!
//! This crate provides the backend for the KBMK organization site: the public
//! profile (pengurus, documentation, schedules, links), the staff directory
//! with role-based access, and the two-stage correspondence workflow for
//! incoming and outgoing letters.

pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod policy;
pub mod routes;
pub mod state;
pub mod storage;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use state::AppState;
