pub mod milestone;

pub use milestone::{CloseFailure, CloseSummary, MilestoneService};
