use thiserror::Error;

/// Classification of REST API failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// 401 / 403: the token is missing, invalid or lacks permission
    #[error("Authentication failed ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// 404: unknown repository or milestone
    #[error("Not found: {0}")]
    NotFound(String),

    /// 422 with an `already_exists` error code, e.g. a duplicate milestone title
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Any other non-success status
    #[error("GitHub API error ({status}): {message}")]
    Remote { status: u16, message: String },

    /// Connectivity problems and timeouts
    #[error("Network error: {0}")]
    Network(String),

    /// The response could not be decoded
    #[error("Failed to decode GitHub API response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Classify a status code returned by the API
    pub fn from_status(status: u16, message: String, already_exists: bool) -> Self {
        match status {
            401 | 403 => Self::Unauthorized { status, message },
            404 => Self::NotFound(message),
            422 if already_exists => Self::Conflict(message),
            _ => Self::Remote { status, message },
        }
    }

    /// Convert octocrab error to the matching category
    pub fn from_octocrab_error(error: octocrab::Error) -> Self {
        tracing::debug!("Raw octocrab error: {:?}", error);

        let result = match &error {
            octocrab::Error::GitHub { source, .. } => {
                let status = source.status_code.as_u16();
                let already_exists = source.errors.as_ref().is_some_and(|errors| {
                    errors.iter().any(|error| {
                        error.get("code").and_then(|code| code.as_str()) == Some("already_exists")
                    })
                });
                let message = match &source.documentation_url {
                    Some(url) => format!("{} (see {})", source.message, url),
                    None => source.message.clone(),
                };
                Self::from_status(status, message, already_exists)
            }
            octocrab::Error::Http { .. }
            | octocrab::Error::Hyper { .. }
            | octocrab::Error::Service { .. } => Self::Network(summary_line(&error)),
            octocrab::Error::Json { .. } | octocrab::Error::Serde { .. } => {
                Self::Decode(summary_line(&error))
            }
            _ => Self::Remote {
                status: 0,
                message: summary_line(&error),
            },
        };

        tracing::trace!("Error classification result: {:?}", result);
        result
    }
}

/// octocrab appends a multi-line backtrace to its messages; keep the first line
fn summary_line(error: &octocrab::Error) -> String {
    let message = error.to_string();
    message.lines().next().unwrap_or_default().trim().to_string()
}

impl From<octocrab::Error> for ApiError {
    fn from(error: octocrab::Error) -> Self {
        Self::from_octocrab_error(error)
    }
}
