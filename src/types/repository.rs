//! Repository identification and API host selection
//!
//! All repository-specific parsing lives here so the CLI and the client
//! agree on what `--repository` and `--hostname` mean.

use clap::ValueEnum;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

static URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:https?://)?[^/]+\.[^/]+/([^/]+)/([^/]+?)(?:\.git)?/?$")
        .expect("Failed to compile repository URL regex")
});

static SIMPLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)$").expect("Failed to compile simple regex")
});

/// Owner name wrapper for type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct Owner(pub String);

impl Owner {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Owner {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Repository name wrapper for type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct RepositoryName(pub String);

impl RepositoryName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RepositoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RepositoryName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A strongly-typed `owner/repo` pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct RepositoryId {
    pub owner: Owner,
    pub repository_name: RepositoryName,
}

impl RepositoryId {
    pub fn new<T1: Into<String>, T2: Into<String>>(owner: T1, name: T2) -> Self {
        Self {
            owner: Owner(owner.into()),
            repository_name: RepositoryName(name.into()),
        }
    }

    /// Parse repository identifier from the accepted input formats
    /// - "owner/repo"
    /// - "https://github.ibm.com/owner/repo" (optionally with `.git`)
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let input_str = input.trim().trim_end_matches('/');

        for regex in [&*SIMPLE_REGEX, &*URL_REGEX] {
            if let Some(captures) = regex.captures(input_str) {
                if let (Some(owner), Some(repo)) = (captures.get(1), captures.get(2)) {
                    return Ok(Self::new(owner.as_str(), repo.as_str()));
                }
            }
        }

        Err(ConfigError::InvalidRepository(input.to_string()))
    }

    /// REST route prefix for this repository
    pub fn api_path(&self) -> String {
        format!("/repos/{}/{}", self.owner, self.repository_name)
    }

    /// Returns the full name (owner/repository_name format)
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repository_name)
    }
}

impl std::fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full_name())
    }
}

impl std::str::FromStr for RepositoryId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// GitHub API domain the tool talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
pub enum ApiHost {
    /// IBM GitHub Enterprise
    #[default]
    #[value(name = "github.ibm.com")]
    #[serde(rename = "github.ibm.com")]
    GithubIbm,
    /// Public GitHub
    #[value(name = "api.github.com")]
    #[serde(rename = "api.github.com")]
    GithubPublic,
}

/// GitHub Enterprise serves the REST API under this path
const ENTERPRISE_API_PATH: &str = "/api/v3";

impl ApiHost {
    pub fn hostname(&self) -> &'static str {
        match self {
            ApiHost::GithubIbm => "github.ibm.com",
            ApiHost::GithubPublic => "api.github.com",
        }
    }

    /// Base URL of the REST API for this host
    pub fn api_base_url(&self) -> String {
        match self {
            ApiHost::GithubIbm => format!("https://{}{}", self.hostname(), ENTERPRISE_API_PATH),
            ApiHost::GithubPublic => format!("https://{}", self.hostname()),
        }
    }
}

impl std::fmt::Display for ApiHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hostname())
    }
}
