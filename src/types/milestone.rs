//! Milestone domain types
//!
//! Milestones are owned by the remote API. The types here only mirror what a
//! single request/response cycle returned; every identifier originates from a
//! decoded response.

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Example: 2019-07-31T23:59:59-04:00
static ISO_8601_DATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}[+-][0-9]{2}:[0-9]{2}$")
        .expect("Failed to compile ISO 8601 date regex")
});

const ISO_8601_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Repository-scoped milestone number assigned by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MilestoneNumber(pub u64);

impl MilestoneNumber {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for MilestoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneState {
    #[default]
    Open,
    Closed,
}

impl MilestoneState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MilestoneState::Open => "open",
            MilestoneState::Closed => "closed",
        }
    }
}

impl std::fmt::Display for MilestoneState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneCreator {
    pub login: String,
}

/// A milestone as returned by the REST API.
///
/// Only `number` is required when decoding; the API may return a partial
/// object and every other field falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub number: MilestoneNumber,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state: MilestoneState,
    #[serde(default)]
    pub due_on: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub open_issues: u64,
    #[serde(default)]
    pub closed_issues: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<MilestoneCreator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Milestone {
    /// An open milestone is overdue when its due date is strictly before `now`.
    /// Milestones without a due date are never overdue.
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        self.state == MilestoneState::Open && self.due_on.is_some_and(|due_on| due_on < now)
    }
}

/// Validated input for creating a milestone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMilestone {
    title: String,
    due_on: Option<DateTime<FixedOffset>>,
}

impl NewMilestone {
    pub fn new<T: Into<String>>(
        title: T,
        due_on: Option<DateTime<FixedOffset>>,
    ) -> Result<Self, ValidationError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        Ok(Self { title, due_on })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn due_on(&self) -> Option<DateTime<FixedOffset>> {
        self.due_on
    }

    /// Request body for `POST /repos/{owner}/{repo}/milestones`
    pub fn to_request(&self) -> CreateMilestoneRequest<'_> {
        CreateMilestoneRequest {
            title: &self.title,
            state: MilestoneState::Open,
            due_on: self.due_on.map(|due_on| {
                due_on
                    .with_timezone(&Utc)
                    .to_rfc3339_opts(SecondsFormat::Secs, true)
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateMilestoneRequest<'a> {
    pub title: &'a str,
    pub state: MilestoneState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_on: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateMilestoneStateRequest {
    pub state: MilestoneState,
}

/// Parse a due date such as `2019-07-31T23:59:59-04:00`.
///
/// The offset is mandatory; bare dates and UTC `Z` suffixes are rejected.
pub fn parse_due_date(input: &str) -> Result<DateTime<FixedOffset>, ValidationError> {
    if !ISO_8601_DATE_REGEX.is_match(input) {
        return Err(ValidationError::InvalidDueDate(input.to_string()));
    }

    DateTime::parse_from_str(input, ISO_8601_DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDueDate(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_due_date() {
        let due_on = parse_due_date("2019-07-31T23:59:59-04:00").unwrap();
        assert_eq!(due_on.offset().local_minus_utc(), -4 * 3600);
        assert_eq!(
            due_on.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2019, 8, 1, 3, 59, 59).unwrap()
        );
    }

    #[test]
    fn test_parse_due_date_rejects_malformed_input() {
        for input in [
            "2019-07-31",
            "2019-07-31T23:59:59",
            "2019-07-31T23:59:59Z",
            "2019-13-31T23:59:59-04:00",
            "July 31, 2019",
        ] {
            assert!(
                matches!(parse_due_date(input), Err(ValidationError::InvalidDueDate(_))),
                "expected {:?} to be rejected",
                input
            );
        }
    }

    #[test]
    fn test_new_milestone_requires_title() {
        assert_eq!(
            NewMilestone::new("   ", None),
            Err(ValidationError::EmptyTitle)
        );
    }

    #[test]
    fn test_create_request_body() {
        let due_on = parse_due_date("2019-07-31T23:59:59-04:00").unwrap();
        let milestone = NewMilestone::new("MVP 3.0 - July 2019", Some(due_on)).unwrap();
        let body = serde_json::to_value(milestone.to_request()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "title": "MVP 3.0 - July 2019",
                "state": "open",
                "due_on": "2019-08-01T03:59:59Z",
            })
        );

        let milestone = NewMilestone::new("Backlog", None).unwrap();
        let body = serde_json::to_value(milestone.to_request()).unwrap();
        assert_eq!(body, serde_json::json!({"title": "Backlog", "state": "open"}));
    }

    #[test]
    fn test_decode_partial_milestone() {
        let milestone: Milestone = serde_json::from_str(r#"{"number":7}"#).unwrap();
        assert_eq!(milestone.number, MilestoneNumber(7));
        assert_eq!(milestone.state, MilestoneState::Open);
        assert!(milestone.due_on.is_none());
    }

    #[test]
    fn test_is_overdue_at() {
        let milestone: Milestone = serde_json::from_value(serde_json::json!({
            "number": 1,
            "title": "Sprint 1",
            "state": "open",
            "due_on": "2019-01-01T08:00:00Z",
        }))
        .unwrap();
        assert!(milestone.is_overdue_at(utc(2020, 1, 1)));
        assert!(!milestone.is_overdue_at(utc(2018, 1, 1)));

        // equal timestamps are not overdue
        let due_on = milestone.due_on.unwrap();
        assert!(!milestone.is_overdue_at(due_on));

        let closed = Milestone {
            state: MilestoneState::Closed,
            ..milestone.clone()
        };
        assert!(!closed.is_overdue_at(utc(2020, 1, 1)));

        let undated = Milestone {
            due_on: None,
            ..milestone
        };
        assert!(!undated.is_overdue_at(utc(2020, 1, 1)));
    }
}
