pub mod milestone;

use serde::{Deserialize, Serialize};

pub use milestone::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownContent(pub String);

/// Due dates are shown in UTC with minute precision
pub fn format_due_on(due_on: Option<chrono::DateTime<chrono::Utc>>) -> String {
    due_on
        .map(|due_on| due_on.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "no due date".to_string())
}
