//! Operator-supplied configuration and the values flowing through an upload.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use zeroize::Zeroizing;

use crate::error::{Error, Result};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_WEB_URL: &str = "https://github.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Target repository, parsed from `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryId {
    owner: String,
    name: String,
}

impl RepositoryId {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Owner and repository names are limited to `[A-Za-z0-9._-]`, so they can
/// be placed in a request path without escaping.
fn valid_repo_part(part: &str) -> bool {
    !part.is_empty()
        && part != "."
        && part != ".."
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

impl FromStr for RepositoryId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidRepository(s.to_string());

        let (owner, name) = s.split_once('/').ok_or_else(invalid)?;

        if !valid_repo_part(owner) || !valid_repo_part(name) {
            return Err(invalid());
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Bearer credential for the GitHub API. Never rendered.
#[derive(Clone)]
pub struct AuthToken(Zeroizing<String>);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Zeroizing::new(token.into()))
    }

    /// Value for the `Authorization` header.
    pub(crate) fn header_value(&self) -> String {
        format!("token {}", self.0.as_str())
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

impl fmt::Display for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Actions secret name, checked against GitHub's naming rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretName(String);

impl SecretName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for SecretName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let reject = |reason| {
            Err(Error::InvalidSecretName {
                name: s.to_string(),
                reason,
            })
        };

        if s.is_empty() {
            return reject("must not be empty");
        }
        if !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return reject("only letters, digits and underscores are allowed");
        }
        if s.starts_with(|c: char| c.is_ascii_digit()) {
            return reject("must not start with a digit");
        }
        if s.to_ascii_uppercase().starts_with("GITHUB_") {
            return reject("the GITHUB_ prefix is reserved");
        }

        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for SecretName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A secret awaiting upload. The plaintext is wiped on drop.
pub struct SecretRecord {
    pub name: SecretName,
    value: Zeroizing<String>,
}

impl SecretRecord {
    pub fn new(name: SecretName, value: impl Into<String>) -> Self {
        Self {
            name,
            value: Zeroizing::new(value.into()),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for SecretRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretRecord")
            .field("name", &self.name)
            .field("value", &"***")
            .finish()
    }
}

/// Everything the uploader needs to talk to GitHub.
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    pub repo: RepositoryId,
    pub token: AuthToken,
    pub api_url: String,
    pub web_url: String,
    pub timeout: Duration,
}

impl UploaderConfig {
    pub fn new(repo: RepositoryId, token: AuthToken) -> Self {
        Self {
            repo,
            token,
            api_url: DEFAULT_API_URL.to_string(),
            web_url: DEFAULT_WEB_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_web_url(mut self, web_url: impl Into<String>) -> Self {
        self.web_url = web_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Actions secrets settings page for the target repository.
    pub fn settings_url(&self) -> String {
        format!("{}/{}/settings/secrets/actions", self.web_url, self.repo)
    }
}
