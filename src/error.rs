//! Error taxonomy
//!
//! Configuration and validation errors are raised before any request is sent
//! and are always fatal. API errors are scoped to the operation that produced
//! them.

use thiserror::Error;

pub use crate::github::error::ApiError;

/// Missing or malformed configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Environment variable not defined: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid repository: '{0}' (expected owner/repo)")]
    InvalidRepository(String),
}

/// Malformed user input
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error(
        "The specified GitHub milestone due date is not a valid ISO 8601 date: {0} (expected e.g. 2019-07-31T23:59:59-04:00)"
    )]
    InvalidDueDate(String),

    #[error("Milestone title must not be empty")]
    EmptyTitle,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Failed to build GitHub client: {0:#}")]
    Client(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
