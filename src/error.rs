use thiserror::Error;

#[derive(Error, Debug)]
pub enum GlabTuiError {
    #[error("API request failed with status {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("API request failed with status {status} after {retries} retries")]
    ApiErrorAfterRetries { status: u16, retries: u32 },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("No GitLab token found - run 'glab auth login' or set GITLAB_TOKEN")]
    NoToken,

    #[error("Could not detect GitLab project: {0}")]
    ProjectContext(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("`{command}` failed ({status}): {stderr}")]
    Command {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Failed to parse {what}: {reason}")]
    Parse { what: &'static str, reason: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GlabTuiError {
    /// True when the collaborator reported that the requested item does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::ApiError { status, .. } => *status == 404,
            Self::Command { stderr, .. } => stderr.contains("404"),
            Self::ProjectNotFound(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, GlabTuiError>;
