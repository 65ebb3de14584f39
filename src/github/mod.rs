pub mod client;
pub mod error;

pub use client::{GitHubClient, MilestoneApi, MilestonePage, PageCursor, RepositorySummary};
pub use error::ApiError;
