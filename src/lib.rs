/// Running one invocation: settings, connection and the requested operations
pub mod app;

/// Command-line arguments and resolved settings
pub mod config;

/// Error taxonomy shared across the crate
pub mod error;

/// Markdown rendering of run reports
pub mod formatter;

/// GitHub REST client and the `MilestoneApi` seam
pub mod github;

/// Milestone operations: create, list and close overdue
pub mod services;

/// Core type definitions and domain models
pub mod types;
