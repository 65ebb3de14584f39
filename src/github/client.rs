use anyhow::{Context, Result};
use octocrab::Octocrab;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time::Duration;
use tracing::{debug, trace};

use crate::github::error::ApiError;
use crate::types::{
    Milestone, MilestoneNumber, MilestoneState, NewMilestone, RepositoryId,
    UpdateMilestoneStateRequest,
};

/// GitHub caps `per_page` at 100 for list endpoints
pub const MAX_PER_PAGE: u8 = 100;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest slice of a non-JSON error body kept in the error message
const ERROR_BODY_PREVIEW_LEN: usize = 200;

static NEXT_LINK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<([^>]+)>\s*;\s*rel="next""#).expect("Failed to compile Link header regex")
});

/// Repository metadata returned by `GET /repos/{owner}/{repo}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub full_name: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Location of the next page of a listing, as given by the `Link` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor(pub String);

impl PageCursor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One page of a milestone listing
#[derive(Debug, Clone, Default)]
pub struct MilestonePage {
    pub milestones: Vec<Milestone>,
    pub next: Option<PageCursor>,
}

/// The REST calls the milestone operations are built on.
///
/// `GitHubClient` is the production implementation; tests substitute an
/// in-memory double.
#[allow(async_fn_in_trait)]
pub trait MilestoneApi {
    async fn fetch_repository(&self, repository: &RepositoryId)
    -> Result<RepositorySummary, ApiError>;

    /// Fetch the first page (`cursor` is `None`) or the page `cursor` points at
    async fn list_milestones(
        &self,
        repository: &RepositoryId,
        state: MilestoneState,
        per_page: u8,
        cursor: Option<&PageCursor>,
    ) -> Result<MilestonePage, ApiError>;

    async fn create_milestone(
        &self,
        repository: &RepositoryId,
        milestone: &NewMilestone,
    ) -> Result<Milestone, ApiError>;

    async fn close_milestone(
        &self,
        repository: &RepositoryId,
        number: MilestoneNumber,
    ) -> Result<Milestone, ApiError>;
}

#[derive(Clone)]
pub struct GitHubClient {
    pub(crate) client: octocrab::Octocrab,
    base_url: String,
}

impl GitHubClient {
    /// Build an authenticated client against `base_url`
    /// (e.g. `https://github.ibm.com/api/v3`).
    pub fn new(base_url: &str, token: String, timeout: Option<Duration>) -> Result<Self> {
        let timeout_duration = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let connection_timeout = if timeout_duration < Duration::from_secs(10) {
            std::cmp::max(timeout_duration, Duration::from_secs(1))
        } else {
            Duration::from_secs(30)
        };
        let read_write_timeout = std::cmp::max(timeout_duration, Duration::from_secs(1));

        let client = Octocrab::builder()
            .base_uri(base_url)
            .with_context(|| format!("Invalid GitHub API URL: {}", base_url))?
            .personal_token(token)
            .set_connect_timeout(Some(connection_timeout))
            .set_read_timeout(Some(read_write_timeout))
            .set_write_timeout(Some(read_write_timeout))
            .build()
            .context("Failed to build GitHub client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Turn a `Link` URL back into a route relative to the API root, so the
    /// base path (`/api/v3` on Enterprise) is applied exactly once.
    fn route_for_cursor(&self, cursor: &PageCursor) -> String {
        match cursor.as_str().strip_prefix(&self.base_url) {
            Some(route) if route.starts_with('/') => route.to_string(),
            _ => cursor.as_str().to_string(),
        }
    }
}

impl MilestoneApi for GitHubClient {
    async fn fetch_repository(
        &self,
        repository: &RepositoryId,
    ) -> Result<RepositorySummary, ApiError> {
        let route = repository.api_path();
        debug!("GET {}", route);

        let response = self.client._get(route.as_str()).await?;
        let status = response.status().as_u16();
        let body = self.client.body_to_string(response).await?;
        decode_response(status, &body)
    }

    async fn list_milestones(
        &self,
        repository: &RepositoryId,
        state: MilestoneState,
        per_page: u8,
        cursor: Option<&PageCursor>,
    ) -> Result<MilestonePage, ApiError> {
        let route = match cursor {
            Some(cursor) => self.route_for_cursor(cursor),
            None => format!(
                "{}/milestones?state={}&per_page={}",
                repository.api_path(),
                state,
                per_page
            ),
        };
        debug!("GET {}", route);

        let response = self.client._get(route.as_str()).await?;
        let status = response.status().as_u16();
        let next = response
            .headers()
            .get("link")
            .and_then(|value| value.to_str().ok())
            .and_then(next_page_link);
        let body = self.client.body_to_string(response).await?;

        let milestones: Vec<Milestone> = decode_response(status, &body)?;
        trace!(
            "Listing returned {} milestones (next page: {:?})",
            milestones.len(),
            next
        );
        Ok(MilestonePage { milestones, next })
    }

    async fn create_milestone(
        &self,
        repository: &RepositoryId,
        milestone: &NewMilestone,
    ) -> Result<Milestone, ApiError> {
        let route = format!("{}/milestones", repository.api_path());
        debug!("POST {}", route);

        let response = self
            .client
            ._post(route.as_str(), Some(&milestone.to_request()))
            .await?;
        let status = response.status().as_u16();
        let body = self.client.body_to_string(response).await?;
        decode_response(status, &body)
    }

    async fn close_milestone(
        &self,
        repository: &RepositoryId,
        number: MilestoneNumber,
    ) -> Result<Milestone, ApiError> {
        let route = format!("{}/milestones/{}", repository.api_path(), number.value());
        let body = UpdateMilestoneStateRequest {
            state: MilestoneState::Closed,
        };
        debug!("PATCH {}", route);

        let response = self.client._patch(route.as_str(), Some(&body)).await?;
        let status = response.status().as_u16();
        let body = self.client.body_to_string(response).await?;
        decode_response(status, &body)
    }
}

/// Error payload GitHub sends with non-success statuses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    documentation_url: Option<String>,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

/// Decode a 2xx body, or classify the status of anything else.
///
/// Error bodies are read best-effort: proxies in front of GitHub Enterprise
/// answer with HTML, which still has to surface as a remote error.
pub(crate) fn decode_response<R: DeserializeOwned>(status: u16, body: &str) -> Result<R, ApiError> {
    if (200..300).contains(&status) {
        return serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()));
    }

    let (message, already_exists) = match serde_json::from_str::<ErrorBody>(body) {
        Ok(error_body) => {
            let already_exists = error_body.errors.iter().any(|error| {
                error.get("code").and_then(|code| code.as_str()) == Some("already_exists")
            });
            let message = error_body
                .message
                .unwrap_or_else(|| format!("HTTP {}", status));
            let message = match error_body.documentation_url {
                Some(url) => format!("{} (see {})", message, url),
                None => message,
            };
            (message, already_exists)
        }
        Err(_) => {
            let preview: String = body.trim().chars().take(ERROR_BODY_PREVIEW_LEN).collect();
            let message = if preview.is_empty() {
                format!("HTTP {}", status)
            } else {
                preview
            };
            (message, false)
        }
    };

    Err(ApiError::from_status(status, message, already_exists))
}

/// Extract the `rel="next"` URL from a `Link` header value
pub(crate) fn next_page_link(link_header: &str) -> Option<PageCursor> {
    NEXT_LINK_REGEX
        .captures(link_header)
        .and_then(|captures| captures.get(1))
        .map(|url| PageCursor(url.as_str().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_page_link() {
        let header = r#"<https://github.ibm.com/api/v3/repositories/42/milestones?state=open&page=2>; rel="next", <https://github.ibm.com/api/v3/repositories/42/milestones?state=open&page=5>; rel="last""#;
        assert_eq!(
            next_page_link(header),
            Some(PageCursor(
                "https://github.ibm.com/api/v3/repositories/42/milestones?state=open&page=2"
                    .to_string()
            ))
        );

        let last_page = r#"<https://api.github.com/repositories/42/milestones?page=1>; rel="first", <https://api.github.com/repositories/42/milestones?page=4>; rel="prev""#;
        assert_eq!(next_page_link(last_page), None);
    }

    #[tokio::test]
    async fn test_route_for_cursor_strips_base_url() {
        let _ = rustls::crypto::ring::default_provider().install_default();
        let client =
            GitHubClient::new("https://github.ibm.com/api/v3/", "token".to_string(), None)
                .unwrap();

        let cursor = PageCursor(
            "https://github.ibm.com/api/v3/repositories/42/milestones?page=2".to_string(),
        );
        assert_eq!(
            client.route_for_cursor(&cursor),
            "/repositories/42/milestones?page=2"
        );

        let foreign = PageCursor("https://example.com/milestones?page=2".to_string());
        assert_eq!(client.route_for_cursor(&foreign), foreign.0);
    }

    #[test]
    fn test_decode_response_html_error_body() {
        let result: Result<RepositorySummary, ApiError> =
            decode_response(503, "<html>503 Service Unavailable</html>");
        assert_eq!(
            result,
            Err(ApiError::Remote {
                status: 503,
                message: "<html>503 Service Unavailable</html>".to_string()
            })
        );

        let result: Result<RepositorySummary, ApiError> = decode_response(502, "");
        assert_eq!(
            result,
            Err(ApiError::Remote {
                status: 502,
                message: "HTTP 502".to_string()
            })
        );
    }

    #[test]
    fn test_decode_response_conflict() {
        let body = serde_json::json!({
            "message": "Validation Failed",
            "errors": [{"resource": "Milestone", "code": "already_exists", "field": "title"}],
        })
        .to_string();
        let result: Result<Milestone, ApiError> = decode_response(422, &body);
        assert_eq!(result, Err(ApiError::Conflict("Validation Failed".to_string())));
    }

    #[test]
    fn test_decode_response_success_with_bad_json() {
        let result: Result<Milestone, ApiError> = decode_response(200, "not json");
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }
}
