//! Core type definitions and domain models
//!
//! Milestones, repository identifiers and the API host selection shared by the
//! client, the service layer and the CLI.

pub mod milestone;
pub mod repository;

pub use milestone::*;
pub use repository::*;
