use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::github::client::MAX_PER_PAGE;
use crate::github::{ApiError, MilestoneApi, PageCursor, RepositorySummary};
use crate::types::{Milestone, MilestoneState, NewMilestone, RepositoryId};

/// A close request that the API rejected
#[derive(Debug, Clone, Serialize)]
pub struct CloseFailure {
    pub milestone: Milestone,
    pub error: String,
}

/// Outcome of closing overdue milestones
#[derive(Debug, Clone, Default, Serialize)]
pub struct CloseSummary {
    pub closed: Vec<Milestone>,
    pub failures: Vec<CloseFailure>,
}

impl CloseSummary {
    pub fn closed_count(&self) -> usize {
        self.closed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Milestone operations for a single repository
pub struct MilestoneService<A> {
    api: A,
    repository: RepositoryId,
    per_page: u8,
}

impl<A: MilestoneApi> MilestoneService<A> {
    pub fn new(api: A, repository: RepositoryId) -> Self {
        Self {
            api,
            repository,
            per_page: MAX_PER_PAGE,
        }
    }

    /// Override the page size used when listing milestones
    pub fn with_per_page(mut self, per_page: u8) -> Self {
        self.per_page = per_page.clamp(1, MAX_PER_PAGE);
        self
    }

    pub fn repository(&self) -> &RepositoryId {
        &self.repository
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Confirm the repository exists and the token can see it
    pub async fn verify_repository(&self) -> Result<RepositorySummary> {
        info!("Retrieving GitHub repository: {}...", self.repository);
        let summary = self
            .api
            .fetch_repository(&self.repository)
            .await
            .inspect_err(|e| {
                error!(
                    "Failed to retrieve GitHub repository: {}. {}",
                    self.repository, e
                )
            })?;
        info!(
            "Successfully retrieved GitHub repository: {}.",
            summary.full_name
        );
        Ok(summary)
    }

    /// Retrieve every open milestone, following `next` links until the last page
    pub async fn list_open(&self) -> Result<Vec<Milestone>> {
        info!("Retrieving all open GitHub milestones...");

        let mut milestones = Vec::new();
        let mut cursor: Option<PageCursor> = None;
        loop {
            let page = self
                .api
                .list_milestones(
                    &self.repository,
                    MilestoneState::Open,
                    self.per_page,
                    cursor.as_ref(),
                )
                .await
                .inspect_err(|e| error!("Failed to retrieve open GitHub milestones: {}", e))?;

            milestones.extend(page.milestones);
            match page.next {
                Some(next) if cursor.as_ref() == Some(&next) => {
                    warn!(
                        "Next page link repeats the current page, stopping: {}",
                        next.as_str()
                    );
                    break;
                }
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        info!(
            "Successfully retrieved all open GitHub milestones: {}.",
            milestones.len()
        );
        for milestone in &milestones {
            debug!("{}", describe(milestone));
        }

        Ok(milestones)
    }

    /// Create a milestone and return it as the API reported it
    pub async fn create(&self, milestone: &NewMilestone) -> Result<Milestone> {
        info!(
            "Creating new GitHub milestone... Name: {}. Due Date: {}.",
            milestone.title(),
            milestone
                .due_on()
                .map(|due_on| due_on.to_rfc3339())
                .unwrap_or_else(|| "none".to_string())
        );

        let created = self
            .api
            .create_milestone(&self.repository, milestone)
            .await
            .inspect_err(|e| {
                if matches!(e, ApiError::Conflict(_)) {
                    error!(
                        "Failed to create GitHub milestone: '{}' already exists.",
                        milestone.title()
                    );
                } else {
                    error!(
                        "Failed to create GitHub milestone '{}': {}",
                        milestone.title(),
                        e
                    );
                }
            })?;

        info!(
            "Successfully created new GitHub milestone {}: {}.",
            created.number,
            milestone.title()
        );
        Ok(created)
    }

    /// Close every open milestone whose due date has passed
    pub async fn close_overdue(&self) -> Result<CloseSummary> {
        self.close_overdue_at(Utc::now()).await
    }

    /// Close every open milestone whose due date is strictly before `now`.
    ///
    /// Listing failures abort the operation; individual close failures are
    /// recorded in the summary and the remaining milestones are still closed.
    pub async fn close_overdue_at(&self, now: DateTime<Utc>) -> Result<CloseSummary> {
        let open_milestones = self.list_open().await?;
        Ok(self.close_overdue_from(open_milestones, now).await)
    }

    /// Close the overdue subset of already listed milestones
    pub async fn close_overdue_from(
        &self,
        milestones: Vec<Milestone>,
        now: DateTime<Utc>,
    ) -> CloseSummary {
        info!("Closing overdue GitHub milestones ({})...", now);

        let mut summary = CloseSummary::default();
        for milestone in milestones
            .into_iter()
            .filter(|milestone| milestone.is_overdue_at(now))
        {
            info!("Closing GitHub milestone... {}", describe(&milestone));
            match self
                .api
                .close_milestone(&self.repository, milestone.number)
                .await
            {
                Ok(closed) => {
                    info!("Successfully closed GitHub milestone {}.", closed.number);
                    summary.closed.push(Milestone {
                        state: MilestoneState::Closed,
                        ..milestone
                    });
                }
                Err(e) => {
                    error!(
                        "Failed to close GitHub milestone {} ({}): {}",
                        milestone.number, milestone.title, e
                    );
                    summary.failures.push(CloseFailure {
                        milestone,
                        error: e.to_string(),
                    });
                }
            }
        }

        if summary.closed.is_empty() && summary.failures.is_empty() {
            info!("No overdue GitHub milestones found.");
        } else if !summary.closed.is_empty() {
            info!(
                "Successfully closed overdue GitHub milestones: {}.",
                summary.closed_count()
            );
        }
        if !summary.failures.is_empty() {
            warn!(
                "Failed to close overdue GitHub milestones: {}.",
                summary.failures.len()
            );
        }

        summary
    }
}

fn describe(milestone: &Milestone) -> String {
    let mut parts = vec![
        format!("Title: {}.", milestone.title),
        format!("Number: {}.", milestone.number.value()),
        format!("State: {}.", milestone.state),
    ];
    if let Some(id) = milestone.id {
        parts.push(format!("ID: {}.", id));
    }
    if let Some(url) = &milestone.html_url {
        parts.push(format!("URL: {}.", url));
    }
    if let Some(creator) = &milestone.creator {
        parts.push(format!("Creator: {}.", creator.login));
    }
    parts.push(format!(
        "Due On: {}.",
        milestone
            .due_on
            .map(|due_on| due_on.to_rfc3339())
            .unwrap_or_else(|| "none".to_string())
    ));
    parts.push(format!("Open Issues: {}.", milestone.open_issues));
    parts.push(format!("Closed Issues: {}.", milestone.closed_issues));
    parts.join(" ")
}
