//! One invocation of the tool, from validated arguments to a run report

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{Args, Settings};
use crate::error::Result;
use crate::github::{GitHubClient, MilestoneApi};
use crate::services::{CloseSummary, MilestoneService};
use crate::types::{Milestone, RepositoryId};

/// What happened during a run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub repository: RepositoryId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_milestones: Option<Vec<Milestone>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_summary: Option<CloseSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<Milestone>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_error: Option<String>,
}

impl RunReport {
    fn new(repository: RepositoryId) -> Self {
        Self {
            repository,
            open_milestones: None,
            close_summary: None,
            created: None,
            create_error: None,
        }
    }

    /// True when every requested operation succeeded
    pub fn is_success(&self) -> bool {
        self.create_error.is_none()
            && self
                .close_summary
                .as_ref()
                .is_none_or(|summary| summary.is_success())
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }
}

/// Resolve settings, connect, and run the requested operations.
///
/// `connect` is only invoked once the settings are valid, so configuration
/// and validation errors never lead to a network call.
pub async fn run<A, F>(args: &Args, access_token: Option<String>, connect: F) -> Result<RunReport>
where
    A: MilestoneApi,
    F: FnOnce(&Settings) -> Result<A>,
{
    let settings = Settings::resolve(args, access_token)?;
    let api = connect(&settings)?;
    execute(api, &settings, Utc::now()).await
}

/// Build the production client for `settings`
pub fn connect_github(settings: &Settings) -> Result<GitHubClient> {
    info!("Connecting to GitHub API v3: {}...", settings.api_base_url);
    let client = GitHubClient::new(
        &settings.api_base_url,
        settings.access_token.expose().to_string(),
        settings.request_timeout,
    )?;
    info!(
        "Successfully connected to GitHub API v3: {}.",
        settings.api_base_url
    );
    Ok(client)
}

/// Run the operations requested in `settings` against `api`.
///
/// Overdue milestones are closed before the new milestone is created, so a
/// freshly created milestone is never a close candidate.
pub async fn execute<A: MilestoneApi>(
    api: A,
    settings: &Settings,
    now: DateTime<Utc>,
) -> Result<RunReport> {
    let service = MilestoneService::new(api, settings.repository.clone());
    let mut report = RunReport::new(settings.repository.clone());

    service.verify_repository().await?;

    if settings.is_list_only() {
        warn!("Neither --milestone-name nor --close-milestones given; listing open milestones only.");
        report.open_milestones = Some(service.list_open().await?);
        return Ok(report);
    }

    if settings.close_overdue {
        report.close_summary = Some(service.close_overdue_at(now).await?);
    }

    if let Some(new_milestone) = &settings.new_milestone {
        match service.create(new_milestone).await {
            Ok(created) => report.created = Some(created),
            Err(e) => report.create_error = Some(e.to_string()),
        }
    }

    Ok(report)
}
