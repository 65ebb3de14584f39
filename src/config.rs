//! Command-line arguments and resolved run settings
//!
//! `Args` is what clap parses. `Settings` is what the run actually uses: the
//! access token has been read and every user-supplied value validated, so any
//! configuration problem surfaces here before a single request is sent.

use clap::{Parser, ValueEnum};
use std::time::Duration;
use tracing::level_filters::LevelFilter;

use crate::error::{ConfigError, Error};
use crate::types::{ApiHost, NewMilestone, RepositoryId, parse_due_date};

/// Environment variable holding the bearer token
pub const GITHUB_ACCESS_TOKEN: &str = "GITHUB_ACCESS_TOKEN";

const AFTER_HELP: &str = "\
=== Environment Variables ===

GITHUB_ACCESS_TOKEN : GitHub access token.

=== Examples ===

export GITHUB_ACCESS_TOKEN=<token>

github-milestone -c -o github.ibm.com -r dap/dsx-service-broker -m \"MVP 3.0 - July 2019\" -t 2019-07-31T23:59:59-04:00";

#[derive(Debug, Clone, Parser)]
#[command(name = "github-milestone")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Create a GitHub milestone and/or close all overdue milestones of a repository")]
#[command(after_help = AFTER_HELP)]
pub struct Args {
    /// Target GitHub API domain
    #[arg(short = 'o', long, value_enum, default_value_t = ApiHost::GithubIbm)]
    pub hostname: ApiHost,

    /// Target GitHub repository (owner/repo)
    #[arg(short, long)]
    pub repository: String,

    /// Create a new GitHub milestone with the specified name
    #[arg(short = 'm', long)]
    pub milestone_name: Option<String>,

    /// Due date of the new milestone. Format: ISO 8601, e.g. 2019-07-31T23:59:59-04:00
    #[arg(short = 't', long, requires = "milestone_name")]
    pub milestone_due_date: Option<String>,

    /// Close all GitHub milestones that are overdue
    #[arg(short, long)]
    pub close_milestones: bool,

    /// Target logging level
    #[arg(short, long, value_enum, ignore_case = true, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Output format of the run report
    #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
    pub format: OutputFormat,

    /// Request timeout in seconds for GitHub API calls (default: 30 seconds)
    #[arg(long)]
    pub request_timeout: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    #[value(name = "CRITICAL")]
    Critical,
    #[value(name = "ERROR")]
    Error,
    #[value(name = "WARNING")]
    Warning,
    #[value(name = "INFO")]
    Info,
    #[value(name = "DEBUG")]
    Debug,
    #[value(name = "TRACE")]
    Trace,
}

impl LogLevel {
    /// tracing has no level above ERROR, so CRITICAL shares it
    pub fn level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Critical | LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
}

/// Bearer credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new<T: Into<String>>(token: T) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccessToken(***)")
    }
}

/// Fully validated settings for one run
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_host: ApiHost,
    pub api_base_url: String,
    pub repository: RepositoryId,
    pub access_token: AccessToken,
    pub new_milestone: Option<NewMilestone>,
    pub close_overdue: bool,
    pub request_timeout: Option<Duration>,
    pub format: OutputFormat,
}

impl Settings {
    /// Validate `args` together with the token read from the environment.
    ///
    /// The token check runs first so a missing credential is always reported,
    /// even if other arguments are also wrong.
    pub fn resolve(args: &Args, access_token: Option<String>) -> Result<Self, Error> {
        let access_token = access_token
            .filter(|token| !token.trim().is_empty())
            .map(AccessToken::new)
            .ok_or(ConfigError::MissingEnvVar(GITHUB_ACCESS_TOKEN))?;

        let repository = RepositoryId::parse(&args.repository)?;

        let due_on = args
            .milestone_due_date
            .as_deref()
            .map(parse_due_date)
            .transpose()?;

        let new_milestone = args
            .milestone_name
            .as_deref()
            .map(|title| NewMilestone::new(title, due_on))
            .transpose()?;

        Ok(Self {
            api_host: args.hostname,
            api_base_url: args.hostname.api_base_url(),
            repository,
            access_token,
            new_milestone,
            close_overdue: args.close_milestones,
            request_timeout: args.request_timeout.map(Duration::from_secs),
            format: args.format,
        })
    }

    /// Point the client at a different API root, e.g. a local mock server
    pub fn with_api_base_url<T: Into<String>>(mut self, api_base_url: T) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    /// True when neither create nor close was requested
    pub fn is_list_only(&self) -> bool {
        self.new_milestone.is_none() && !self.close_overdue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    fn parse(args: &[&str]) -> Args {
        let mut argv = vec!["github-milestone"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["--repository", "org/repo"]);
        assert_eq!(args.hostname, ApiHost::GithubIbm);
        assert_eq!(args.log_level, LogLevel::Info);
        assert_eq!(args.format, OutputFormat::Markdown);
        assert!(!args.close_milestones);
    }

    #[test]
    fn test_short_flags() {
        let args = parse(&[
            "-c",
            "-o",
            "api.github.com",
            "-r",
            "org/repo",
            "-m",
            "MVP 3.0",
            "-t",
            "2019-07-31T23:59:59-04:00",
            "-l",
            "debug",
        ]);
        assert_eq!(args.hostname, ApiHost::GithubPublic);
        assert!(args.close_milestones);
        assert_eq!(args.milestone_name.as_deref(), Some("MVP 3.0"));
        assert_eq!(args.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_repository_is_required() {
        assert!(Args::try_parse_from(["github-milestone", "-c"]).is_err());
    }

    #[test]
    fn test_due_date_requires_name() {
        let result = Args::try_parse_from([
            "github-milestone",
            "-r",
            "org/repo",
            "-t",
            "2019-07-31T23:59:59-04:00",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_hostname_rejected() {
        let result = Args::try_parse_from(["github-milestone", "-r", "org/repo", "-o", "gitlab.com"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_missing_token() {
        let args = parse(&["-r", "org/repo", "-c"]);
        for token in [None, Some(String::new()), Some("  ".to_string())] {
            let result = Settings::resolve(&args, token);
            assert!(matches!(
                result,
                Err(Error::Configuration(ConfigError::MissingEnvVar(GITHUB_ACCESS_TOKEN)))
            ));
        }
    }

    #[test]
    fn test_resolve_invalid_due_date() {
        let args = parse(&["-r", "org/repo", "-m", "Sprint 5", "-t", "2019-07-31"]);
        let result = Settings::resolve(&args, Some("token".into()));
        assert!(matches!(
            result,
            Err(Error::Validation(ValidationError::InvalidDueDate(_)))
        ));
    }

    #[test]
    fn test_resolve_invalid_repository() {
        let args = parse(&["-r", "not-a-repo", "-c"]);
        let result = Settings::resolve(&args, Some("token".into()));
        assert!(matches!(
            result,
            Err(Error::Configuration(ConfigError::InvalidRepository(_)))
        ));
    }

    #[test]
    fn test_resolve_settings() {
        let args = parse(&[
            "-r",
            "org/repo",
            "-m",
            "Sprint 5",
            "-t",
            "2019-07-31T23:59:59-04:00",
            "--request-timeout",
            "5",
        ]);
        let settings = Settings::resolve(&args, Some("secret".into())).unwrap();

        assert_eq!(settings.repository, RepositoryId::new("org", "repo"));
        assert_eq!(settings.api_base_url, "https://github.ibm.com/api/v3");
        assert_eq!(settings.request_timeout, Some(Duration::from_secs(5)));
        assert_eq!(
            settings.new_milestone.as_ref().map(|m| m.title()),
            Some("Sprint 5")
        );
        assert!(!settings.close_overdue);
        assert!(!settings.is_list_only());
        assert!(!format!("{:?}", settings).contains("secret"));
    }

    #[test]
    fn test_log_level_filter() {
        assert_eq!(LogLevel::Critical.level_filter(), LevelFilter::ERROR);
        assert_eq!(LogLevel::Warning.level_filter(), LevelFilter::WARN);
        assert_eq!(LogLevel::Trace.level_filter(), LevelFilter::TRACE);
    }
}
