use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised while uploading a repository secret.
#[derive(Debug, Error)]
pub enum Error {
    #[error("request to GitHub failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("GitHub rejected the token ({status}): {body}")]
    Auth { status: StatusCode, body: String },

    #[error("repository or public key not found (404): {body}")]
    NotFound { body: String },

    #[error("unexpected response fetching public key ({status}): {body}")]
    Api { status: StatusCode, body: String },

    #[error("malformed public key response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error("upload failed ({status}): {body}")]
    Upload { status: StatusCode, body: String },

    #[error("invalid public key material: {0}")]
    Encoding(String),

    #[error("token contains characters that are not allowed in an HTTP header")]
    InvalidToken,

    #[error("invalid repository '{0}': expected owner/name")]
    InvalidRepository(String),

    #[error("invalid secret name '{name}': {reason}")]
    InvalidSecretName { name: String, reason: &'static str },

    #[error(
        "no secret value supplied: pass --secret-value, set GITHUB_SECRETS_VALUE, or use --value-stdin"
    )]
    MissingValue,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status returned by GitHub, if the error came from a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Auth { status, .. }
            | Error::Api { status, .. }
            | Error::Upload { status, .. } => Some(*status),
            Error::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            Error::Transport(e) => e.status(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
